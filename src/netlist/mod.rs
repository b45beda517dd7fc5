// SPDX-License-Identifier: Apache-2.0

pub mod count;
pub mod design;
pub mod error;
pub mod io;
pub mod parse;
pub mod report;
pub mod scan;
