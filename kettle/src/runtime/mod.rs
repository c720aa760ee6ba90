//! Runtime configuration.

pub mod options;

pub use options::{
    KettleOptions, ResourceOptions, StackAllowance, Stage1Options, Stage2Options, ToolchainOptions,
};
