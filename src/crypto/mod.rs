mod cipher;

pub use cipher::{CipherError, TokenCipher};
