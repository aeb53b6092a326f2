pub mod password;
pub mod secret_string;

pub use password::{obtain_passphrase, prompt_for_new_passphrase};
pub use secret_string::SecretString;
