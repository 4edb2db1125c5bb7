// handlers/protected/mod.rs - Protected handlers (authenticated user required)
//
// Every route here sits behind `require_auth`, so an `AuthUser` extension is
// always present. Finer role and policy checks are declared on the
// application requests and enforced by the pipeline.

pub mod manage; // /api/Users/manage/* account self-service
pub mod todo_items; // /api/TodoItems
pub mod todo_lists; // /api/TodoLists
pub mod weather_forecasts; // /api/WeatherForecasts
