mod response_code;
mod rpc_request;
mod rpc_response;

pub use response_code::ResponseCode;
pub use rpc_request::RpcRequest;
pub use rpc_response::RpcResponse;
