//! Core library for the remuneraciones-tools command line application.
//!
//! The library turns payroll workbooks into per-program apportioned salary
//! figures. IO adapters live under [`remuneraciones::tools::io`], the
//! in-memory table under [`remuneraciones::tools::model`], hour aggregation
//! and the join in [`remuneraciones::tools::hours`] and
//! [`remuneraciones::tools::merge`], the proportional split in
//! [`remuneraciones::tools::apportion`], and the run orchestration under
//! [`remuneraciones::tools::pipeline`] and
//! [`remuneraciones::tools::duplicates`].

pub mod remuneraciones;

pub use remuneraciones::tools::{
    Result, ToolError, apportion, config, duplicates, error, hours, io, logging, merge, mode,
    model, pipeline, validate, worker,
};
