pub mod bluetooth;
pub mod dispatcher;
pub mod logging;
