pub mod catalog;
pub mod kind;
pub mod params;

pub use catalog::{EffectCatalog, TestSignalConfig};
pub use kind::EffectKind;
pub use params::{parse_param_bag, ParamBag, ParamValue, ParameterUpdater, UpdateReport};
