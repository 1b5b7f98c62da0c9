mod address;
mod assets;
mod error;
mod graph;
mod hw_config;
mod loader;
mod raw;
mod schema;
mod term_logger;
mod validator;

pub use address::{Address, AddressKind, BoardAddress, DeviceNumber};
pub use assets::reference_document;
pub use error::{ConfigResult, ErrorExt, ErrorKind, LoadError, ValidationError, ValidationErrors, VoidResult};
pub use graph::{Collision, ConfigGraph, EventBinding, FlipperParts, Referrer};
pub use hw_config::{
    AutofireCoil, Coil, Debounce, EventList, Flipper, Gi, Hardware, HwConfig, Led, MatrixLight, Servo, Switch,
    SwitchType,
};
pub use loader::{load, load_file, load_files, load_reference, LoaderOptions};
pub use schema::{Category, CONFIG_VERSION};
pub use term_logger::TermLogger;
