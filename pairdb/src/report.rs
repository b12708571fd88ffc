//! Text dumps of the table layout and of everyone's relationship lists.

use std::fmt;

use indexmap::IndexSet;
use pairtable::{PeopleTable, RelationKind, Slot};

const RULE: &str = "------------------------------------------------------------------------------------------";

/// Slot-by-slot view: index, status, id, self vector and preference vector.
pub struct TableDump<'a>(pub &'a PeopleTable);

impl fmt::Display for TableDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0;
        writeln!(
            f,
            "Table size: {} | Active: {} | Tombstones: {} | Load factor: {:.2}",
            t.capacity(),
            t.len(),
            t.tombstones(),
            t.load_factor()
        )?;
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "{:<6} | {:<9} | {:<35} | {:<16} | {:<16}",
            "IDX", "STATUS", "ID", "SELF", "PREFS"
        )?;
        writeln!(f, "{RULE}")?;
        for (i, slot) in t.slots() {
            match slot {
                Slot::Occupied(p) => writeln!(
                    f,
                    "{:<6} | {:<9} | {:<35} | {:<16} | {:<16}",
                    i,
                    "Active",
                    p.id(),
                    format!("{:?}", p.self_vector()),
                    format!("{:?}", p.preference())
                )?,
                Slot::Tombstone => writeln!(
                    f,
                    "{:<6} | {:<9} | {:<35} | {:<16} | {:<16}",
                    i, "Deleted", "---", "---", "---"
                )?,
                Slot::Empty => writeln!(
                    f,
                    "{:<6} | {:<9} | {:<35} | {:<16} | {:<16}",
                    i, "Empty", "---", "---", "---"
                )?,
            }
        }
        writeln!(f, "{RULE}")
    }
}

/// Pending and matched lists for every active person, in slot order.
pub struct RelationsDump<'a>(pub &'a PeopleTable);

impl fmt::Display for RelationsDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in self.0.iter() {
            writeln!(f, "User: {} ({})", p.display_name(), p.id())?;
            writeln!(f, "   -> Liked:          {}", join(p.pending(RelationKind::Romantic)))?;
            writeln!(f, "   -> Friend-liked:   {}", join(p.pending(RelationKind::Friend)))?;
            writeln!(f, "   -> Matches:        {}", join(p.matched(RelationKind::Romantic)))?;
            writeln!(f, "   -> Friend matches: {}", join(p.matched(RelationKind::Friend)))?;
            writeln!(f, "{RULE}")?;
        }
        Ok(())
    }
}

fn join(ids: &IndexSet<String>) -> String {
    let parts: Vec<&str> = ids.iter().map(String::as_str).collect();
    format!("[{}]", parts.join(", "))
}
