pub mod bus;
pub mod rpc;
pub mod tcp;

pub use bus::{BusError, BusTransport, MessageBus};
pub use rpc::{ProductsController, RpcError, RpcErrorPolicy, RpcHandler};
pub use tcp::{ClientError, TcpClient, TcpTransport};
