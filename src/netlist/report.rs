// SPDX-License-Identifier: Apache-2.0

//! Placement reports for flattened instance counts.

use serde::Serialize;

use crate::netlist::count::InstanceCounts;
use crate::netlist::design::Design;
use crate::netlist::error::NetlistError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub cell: String,
    pub count: u64,
}

/// Flattened counts of one top module, sorted by cell name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementReport {
    pub top: String,
    pub total: u64,
    pub placements: Vec<Placement>,
}

impl PlacementReport {
    /// Fails with `CountOverflow` when the per-cell counts fit but their sum
    /// does not.
    pub fn new(
        design: &Design,
        top: &str,
        counts: &InstanceCounts,
    ) -> Result<Self, NetlistError> {
        let total = counts.total().ok_or_else(|| NetlistError::CountOverflow {
            module: top.to_string(),
        })?;
        let placements = design
            .named_counts(counts)
            .into_iter()
            .map(|(cell, count)| Placement {
                cell: cell.to_string(),
                count,
            })
            .collect();
        Ok(Self {
            top: top.to_string(),
            total,
            placements,
        })
    }

    /// One line per cell: the name left-justified to 15 columns, then the
    /// count.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for p in &self.placements {
            out.push_str(&format!("{:15} : {} placements\n", p.cell, p.count));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::parse::parse_netlist_str;
    use pretty_assertions::assert_eq;

    const SRC: &str = "
module cellB(a);
  wire a;
  INV u3(.A(a));
  INV u4(.A(a));
endmodule
module TopCell(x);
  wire x;
  AND2 u1(.A(x), .B(x));
  cellB u2(.a(x));
endmodule
";

    #[test]
    fn test_text_report() {
        let design = parse_netlist_str(SRC).unwrap();
        let counts = design.count_instances("TopCell").unwrap();
        let report = PlacementReport::new(&design, "TopCell", counts).unwrap();
        assert_eq!(
            report.to_text(),
            "AND2            : 1 placements\n\
             INV             : 2 placements\n\
             cellB           : 1 placements\n"
        );
    }

    #[test]
    fn test_text_report_long_name_is_not_truncated() {
        let src = "module t(a); A_VERY_LONG_CELL_NAME_X1 u0(.A(a)); endmodule";
        let design = parse_netlist_str(src).unwrap();
        let counts = design.count_instances("t").unwrap();
        let report = PlacementReport::new(&design, "t", counts).unwrap();
        assert_eq!(report.to_text(), "A_VERY_LONG_CELL_NAME_X1 : 1 placements\n");
    }

    #[test]
    fn test_json_report() {
        let design = parse_netlist_str(SRC).unwrap();
        let counts = design.count_instances("TopCell").unwrap();
        let report = PlacementReport::new(&design, "TopCell", counts).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "top": "TopCell",
                "total": 4,
                "placements": [
                    {"cell": "AND2", "count": 1},
                    {"cell": "INV", "count": 2},
                    {"cell": "cellB", "count": 1},
                ]
            })
        );
    }

    #[test]
    fn test_empty_report() {
        let design = parse_netlist_str("module e(a); endmodule").unwrap();
        let counts = design.count_instances("e").unwrap();
        let report = PlacementReport::new(&design, "e", counts).unwrap();
        assert_eq!(report.to_text(), "");
        assert_eq!(report.total, 0);
    }

    #[test]
    fn test_report_total_overflow() {
        // Every level doubles both cells, so `m62` has 2^63 of each.
        let mut src = String::from(
            "module m0(a);\n  INV u0(.A(a)); INV u1(.A(a));\n  BUF u2(.A(a)); BUF u3(.A(a));\nendmodule\n",
        );
        for i in 1..=62 {
            src.push_str(&format!(
                "module m{}(a); m{p} u0(.a(a)); m{p} u1(.a(a)); endmodule\n",
                i,
                p = i - 1
            ));
        }
        let design = parse_netlist_str(&src).unwrap();
        let counts = design.count_instances("m62").unwrap();
        assert_eq!(counts.total(), None);
        assert_eq!(
            PlacementReport::new(&design, "m62", counts).unwrap_err(),
            NetlistError::CountOverflow {
                module: "m62".to_string()
            }
        );
    }
}
