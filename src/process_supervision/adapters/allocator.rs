//! Tool ports backed by the port allocator.

use crate::instance::InstanceName;
use crate::port_allocation::{
    domain::PortAllocationResult,
    ports::{PortProbe, PortRegistryStore},
    services::PortAllocator,
};
use crate::process_supervision::ports::ToolPortSource;
use async_trait::async_trait;

#[async_trait]
impl<S, P> ToolPortSource for PortAllocator<S, P>
where
    S: PortRegistryStore,
    P: PortProbe,
{
    async fn tool_port(&self, instance: &InstanceName, server: &str) -> PortAllocationResult<u16> {
        self.get_tool_port(instance, server).await
    }
}
