//! Wire-level types shared by the transport, the session and the front ends.
pub mod types;

pub use types::{
    EmptyPortName, ListResponse, Port, ReadResponse, RegisterSetting, RegisterSnapshot,
    RegisterValues, SubmitBody, REGISTER_COUNT,
};
