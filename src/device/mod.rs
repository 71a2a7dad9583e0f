pub mod adb;
pub mod device;
