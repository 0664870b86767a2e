//! Phase modules - first-class concepts in the install lifecycle

pub mod acquire;
pub mod link;
pub mod virtualenv;

pub use virtualenv::{
    pip_install_resource, virtualenv_create, virtualenv_create_in_libexec,
    virtualenv_install_with_resources,
};
