//! Deterministic text renderers for types and monoids (§6
//! "Pretty-printers"). Plain `format!`-based rendering, matching the
//! teacher's diagnostics style rather than pulling in a layout-engine crate.

use crate::record::RecordAttributes;

#[must_use]
pub fn format_record(atts: &RecordAttributes) -> String {
    match atts {
        RecordAttributes::Attributes(fields) => {
            let mut s = String::from("record(");
            for (i, a) in fields.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                s.push_str(&format!("{}: {}", a.idn, a.ty));
            }
            s.push(')');
            s
        }
        RecordAttributes::AttributesVariable(fields, sym) => {
            let mut s = format!("record(..{sym}, ");
            for (i, a) in fields.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                s.push_str(&format!("{}: {}", a.idn, a.ty));
            }
            s.push(')');
            s
        }
        RecordAttributes::ConcatAttributes(sym) => format!("record(concat {sym})"),
    }
}
