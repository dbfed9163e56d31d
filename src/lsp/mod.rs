//! Language server adapter. The editor is the host, the tree and the
//! filter box live on the client side and are reached through custom
//! notifications.

pub mod backend;
pub mod protocol;
