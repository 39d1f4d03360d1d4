pub mod args;
pub mod codec;
pub mod table;
pub mod validate;

mod error;

pub use args::{ArgValue, ArgsMap, WidgetState, WidgetValue};
pub use error::{Bound, Error, ErrorKind, Result};
pub use table::{FieldTable, OrderedPair};
pub use validate::{BuildContext, NumericField, ValidationPipeline};
