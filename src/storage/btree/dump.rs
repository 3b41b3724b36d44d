use std::fmt::{Display, Write as _};
use std::io;

use crate::types::{PageId, Result};

use super::tree::{BTree, TreeState};

const INDENT: &str = "  ";

impl<K: Display, V: Display> TreeState<K, V> {
    fn dump_page(&self, page_id: PageId, level: usize, out: &mut String) {
        let page = self.pages.get(page_id);
        for _ in 0..level {
            out.push_str(INDENT);
        }
        let _ = write!(out, "level {level} page {page_id} [");
        for (idx, entry) in page.entries.iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{}:{}", entry.key(), entry.id());
        }
        out.push_str("]\n");
        for &child in &page.children {
            self.dump_page(child, level + 1, out);
        }
    }
}

impl<K: Display, V: Display> BTree<K, V> {
    /// Renders the page structure, one line per page in pre-order, indented
    /// by level. Diagnostic output only; the format is not parsed back.
    pub fn dump(&self) -> String {
        let state = self.state.lock();
        let mut out = String::new();
        state.dump_page(state.root, 0, &mut out);
        out
    }

    /// Writes [`BTree::dump`] to `out`.
    pub fn print<W: io::Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.dump().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_dump() -> Result<()> {
        let tree = BTree::new(3)?;
        tree.insert_many([('B', 2), ('A', 1)]);
        let dump = tree.dump();
        assert!(dump.starts_with("level 0 page #"));
        assert!(dump.ends_with("[A:1 B:2]\n"));
        Ok(())
    }

    #[test]
    fn children_are_indented_below_parent() -> Result<()> {
        let tree = BTree::new(3)?;
        tree.insert_many((1..=6u32).map(|k| (k, k * k)));
        let mut out = Vec::new();
        tree.print(&mut out)?;
        let text = String::from_utf8(out).expect("utf8 dump");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("level 0 ") && lines[0].ends_with("[4:16]"));
        assert!(lines[1].starts_with("  level 1 ") && lines[1].ends_with("[1:1 2:4 3:9]"));
        assert!(lines[2].starts_with("  level 1 ") && lines[2].ends_with("[5:25 6:36]"));
        Ok(())
    }
}
