//! Naming directory connection over the `naming` client

use tokio::runtime::Handle;
use tracing::debug;
use naming::{Name, NamingClient};
use crate::descriptor::EndpointDescriptor;
use crate::error::Result;
use crate::runtime::NamingDirectory;

/// Connected naming directory, driven on the runtime's worker threads
pub struct RemoteDirectory {
    client: NamingClient,
    handle: Handle,
}

impl RemoteDirectory {
    pub(crate) fn new(client: NamingClient, handle: Handle) -> Self {
        Self { client, handle }
    }
}

impl NamingDirectory for RemoteDirectory {
    fn resolve(&self, context: &str, leaf: &str) -> Result<EndpointDescriptor> {
        let name = Name::new(context, leaf)?;
        let reference = self.handle.block_on(self.client.resolve(&name))?;
        Ok(EndpointDescriptor::new(reference.to_stringified()?))
    }

    fn close(self) -> Result<()> {
        let peer = self.client.peer_addr();
        drop(self.client);
        debug!("naming directory reference for {} released", peer);
        Ok(())
    }
}
