pub mod command;
pub mod frame;
pub mod types;

pub use command::{decode_hex, Command, EncodeError};
pub use frame::{
    decode, DecodeError, FRAME_LEN, UUID_CUSTOM_SERVICE, UUID_CUSTOM_SERVICE_NOTIFY,
    UUID_CUSTOM_SERVICE_WRITE,
};
pub use types::{Buttons, SensorFrame, TouchPosition};
