// SPDX-License-Identifier: Apache-2.0

//! Parses structural Verilog netlists (modules, nets, and instances with named
//! port connections) and counts the primitive cells of a module by flattening
//! its hierarchy.
//!
//! ```
//! use hiercount::netlist::parse::parse_netlist_str;
//!
//! let design = parse_netlist_str(
//!     "module leaf(a); INV u0(.A(a)); endmodule
//!      module top(a); leaf l0(.a(a)); leaf l1(.a(a)); endmodule",
//! )
//! .unwrap();
//! let counts = design.count_instances("top").unwrap();
//! assert_eq!(design.named_counts(counts), vec![("INV", 2), ("leaf", 2)]);
//! ```

pub mod netlist;
