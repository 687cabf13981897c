mod attrs;
mod convert;
mod props;
mod time;
mod types;

pub use attrs::{
    AttrResult, Attributes, resolve, resolve_bool, resolve_f64, resolve_single, resolve_str,
    resolve_u64,
};
pub use convert::{
    convert_burn_rate, convert_predictions, convert_session, convert_session_at, convert_totals,
    try_convert_session,
};
pub use props::{Properties, extract};
pub use time::{RawTimestamp, normalize_datetime};
pub use types::{AttrError, ConvertError};
