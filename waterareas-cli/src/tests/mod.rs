//! Shared test harness modules for the `waterareas` CLI.

use super::*;

mod helpers;
