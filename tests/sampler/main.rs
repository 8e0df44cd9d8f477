#![allow(clippy::cast_precision_loss)]

mod gp;
mod local_kernel;
mod space_filling;
