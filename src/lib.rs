pub mod api;
pub mod cli;
pub mod error;
pub mod pagination;
pub mod report;
pub mod sink;
pub mod util;

pub use api::{AdSenseClient, Config};
pub use error::ApiError;
pub use pagination::{Page, Paginator, collect_all, for_each_item};
pub use report::{ReportQuery, ad_client_filter, date_to_fields, escape_filter_parameter, trailing_window};
pub use util::{account_line, ad_client_line, ad_unit_line};
