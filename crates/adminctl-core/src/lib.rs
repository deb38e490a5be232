// ABOUTME: Core engine of the headless admin console: session, guards, CRUD controller, interceptor.
// ABOUTME: Everything here is transport-agnostic; the HTTP layer lives in adminctl-client.

pub mod controller;
pub mod error;
pub mod events;
pub mod guard;
pub mod interceptor;
pub mod mode;
pub mod session;

pub use controller::{CrudController, FormData, ResourceOps, ResourceRecord, form_fields};
pub use error::{AuthKind, ConsoleError};
pub use events::{ConsoleEvent, EventBus, EventTopic};
pub use guard::{GuardCtx, GuardFlags, GuardOutcome, evaluate};
pub use interceptor::{LoginInterceptor, PromptState, THROTTLE_WINDOW};
pub use mode::ViewMode;
pub use session::{Account, AccountState, SessionHandle, TokenPair};
