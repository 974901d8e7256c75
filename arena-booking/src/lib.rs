pub mod checkout;
pub mod confirmation;
pub mod dispatcher;
pub mod mock;

pub use checkout::{CheckoutError, CheckoutInitiator, CheckoutRequest};
pub use confirmation::{Acknowledgement, ConfirmationError, ConfirmationReceiver};
pub use dispatcher::NotificationDispatcher;
pub use mock::{MockPaymentProvider, RecordingNotifier};
