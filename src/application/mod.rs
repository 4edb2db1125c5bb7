//! Application requests: the commands and queries behind the HTTP endpoints.
//! Each one is a `pipeline::Request` and runs through `pipeline::Sender`.

pub mod common;
pub mod todo_items;
pub mod todo_lists;
pub mod weather_forecasts;
