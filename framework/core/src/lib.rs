mod error;
mod shutdown;

pub mod prelude {
    pub use crate::error::{
        ConfigurationError, MalformedSample, RequestError, RequestErrorKind, StepError,
    };
    pub use crate::shutdown::{DelegatedShutdownListener, ShutdownHandle};
}
