// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Conversion of execution results into JSON-RPC responses.

#[macro_use]
extern crate log;

pub mod error;
