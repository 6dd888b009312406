//! Tool catalog, argument decoding and execution.

pub mod arguments;
pub mod calendar;
pub mod command;
pub mod error;
pub mod executor;
pub mod fuzzy;
pub mod journal;
pub mod reducers;
pub mod registry;
pub mod schema;

pub use arguments::ToolArguments;
pub use calendar::{
    CalendarError, CalendarService, DisconnectedCalendar, EventPatch, EventWindow,
    GoogleCalendarClient, NewEvent,
};
pub use command::{describe_request, ToolCommand};
pub use error::{ToolError, CALENDAR_PERMISSION_TEXT};
pub use executor::{ToolExecutor, ToolHandler};
pub use journal::JournalCatalog;
pub use registry::{declarations, trust_of, ToolDeclaration, ToolKind, ToolTrustClass};
pub use schema::ToolParameters;
