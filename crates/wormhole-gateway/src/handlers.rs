mod health;
mod redirect;
mod url;

pub use health::health_handler;
pub use redirect::redirect_handler;
pub use url::{
    delete_url_handler, get_url_handler, restore_url_handler, shorten_url_handler,
    validate_url_handler,
};
