//! Textual rendering of a [`DecisionProcedure`] as a function of the circuit language.
//!
//! The rendered function takes the two input shares `x0` and `x1`, the mask `r` and one
//! precomputed product per segment. It sums the shares, walks the decision tree and returns
//! the selected product minus `r`.
use std::fmt::{self, Display, Formatter};

use crate::decision::{DecisionNode, DecisionProcedure, NodeId, Test};

const INDENT: &str = "    ";
const PARAMS_PER_LINE: usize = 10;

pub struct Rendered<'a> {
    procedure: &'a DecisionProcedure,
    name: &'a str,
    value_bits: u32,
}

impl<'a> Rendered<'a> {
    pub fn new(procedure: &'a DecisionProcedure, name: &'a str, value_bits: u32) -> Self {
        Self {
            procedure,
            name,
            value_bits,
        }
    }

    fn write_tree(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut stack = vec![Step::Node(self.procedure.root(), 1)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Node(id, depth) => {
                    let indent = INDENT.repeat(depth);
                    match *self.procedure.node(id) {
                        DecisionNode::Leaf(idx) => writeln!(f, "{indent}ret = prod{idx};")?,
                        DecisionNode::Branch {
                            test,
                            then,
                            otherwise,
                        } => {
                            writeln!(f, "{indent}if ({}) {{", Condition(&test))?;
                            stack.extend([
                                Step::Close(depth),
                                Step::Node(otherwise, depth + 1),
                                Step::Else(depth),
                                Step::Node(then, depth + 1),
                            ]);
                        }
                    }
                }
                Step::Else(depth) => writeln!(f, "{}}} else {{", INDENT.repeat(depth))?,
                Step::Close(depth) => writeln!(f, "{}}}", INDENT.repeat(depth))?,
            }
        }
        Ok(())
    }
}

/// Pending output while walking the tree, popped in reverse order of pushing.
enum Step {
    Node(NodeId, usize),
    Else(usize),
    Close(usize),
}

struct Condition<'a>(&'a Test);

impl Display for Condition<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Test::Below(bp) => write!(f, "sum < {bp}"),
            Test::Within { lower, upper } => write!(f, "sum > {lower} && sum <= {upper}"),
            Test::Above(bp) => write!(f, "sum > {bp}"),
        }
    }
}

impl Display for Rendered<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ty = format!("int{}", self.value_bits);
        let head = format!("func ss_{}(", self.name);
        let align = " ".repeat(head.len());
        write!(f, "{head}{ty} x0, {ty} x1, {ty} r,")?;
        for idx in 0..self.procedure.segment_count() {
            if idx % PARAMS_PER_LINE == 0 {
                write!(f, "\n{align}")?;
            } else {
                write!(f, " ")?;
            }
            write!(f, "{ty} prod{idx}")?;
            if idx + 1 < self.procedure.segment_count() {
                write!(f, ",")?;
            }
        }
        writeln!(f, ") {{")?;
        writeln!(f, "{INDENT}{ty} ret = 0;")?;
        writeln!(f, "{INDENT}{ty} sum = x0 + x1;")?;
        self.write_tree(f)?;
        writeln!(f, "{INDENT}ret = ret - r;")?;
        writeln!(f, "{INDENT}return ret;")?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::FixedSegment;

    #[test]
    fn render_two_segments() {
        let segments = [
            FixedSegment {
                lower: -8,
                upper: 0,
                slope: 1,
                intercept: 0,
            },
            FixedSegment {
                lower: 0,
                upper: 8,
                slope: 2,
                intercept: 0,
            },
        ];
        let proc = DecisionProcedure::build(&segments, 0).unwrap();
        let expected = "\
func ss_lin(int32 x0, int32 x1, int32 r,
            int32 prod0, int32 prod1) {
    int32 ret = 0;
    int32 sum = x0 + x1;
    if (sum < -8) {
        ret = prod0;
    } else {
        if (sum > -8 && sum <= 0) {
            ret = prod0;
        } else {
            if (sum > 0) {
                ret = prod1;
            } else {
                ret = prod0;
            }
        }
    }
    ret = ret - r;
    return ret;
}";
        assert_eq!(Rendered::new(&proc, "lin", 32).to_string(), expected);
    }

    #[test]
    fn params_wrap_every_ten() {
        let segments: Vec<_> = (0..12)
            .map(|i| FixedSegment {
                lower: i,
                upper: i + 1,
                slope: 0,
                intercept: 0,
            })
            .collect();
        let proc = DecisionProcedure::build(&segments, 0).unwrap();
        let text = Rendered::new(&proc, "f", 64).to_string();
        let header: Vec<_> = text.lines().take(3).collect();
        assert!(header[1].trim_start().starts_with("int64 prod0,"));
        assert!(header[1].trim_end().ends_with("int64 prod9,"));
        assert_eq!(header[2].trim(), "int64 prod10, int64 prod11) {");
    }

    #[test]
    fn nested_blocks_balance() {
        let segments: Vec<_> = (0..1000)
            .map(|i| FixedSegment {
                lower: i,
                upper: i + 1,
                slope: 0,
                intercept: 0,
            })
            .collect();
        let proc = DecisionProcedure::build(&segments, 0).unwrap();
        let text = Rendered::new(&proc, "deep", 64).to_string();
        assert_eq!(text.matches("if (").count(), 1001);
        assert_eq!(text.matches("} else {").count(), 1001);
        assert_eq!(text.matches("ret = prod").count(), 1002);
        assert_eq!(text.matches('{').count(), text.matches('}').count());
        let innermost = format!("{}if (sum > 999) {{", INDENT.repeat(1001));
        assert!(text.contains(&innermost));
        assert!(text.ends_with("    ret = ret - r;\n    return ret;\n}"));
    }
}
