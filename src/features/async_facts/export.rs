//! Line-delimited JSON export for a fact set: one record per line,
//! ASCII-safe, ordered by fact kind then insertion order.

use crate::errors::PtaResult;

use super::types::AsyncFact;

/// Render `facts` as newline-delimited JSON, sorted by
/// [`AsyncFact::kind_rank`] with a stable sort so insertion order is
/// preserved within a kind.
pub fn to_jsonl(facts: &[AsyncFact]) -> PtaResult<String> {
    let mut ordered: Vec<&AsyncFact> = facts.iter().collect();
    ordered.sort_by_key(|f| f.kind_rank());

    let mut out = String::new();
    for fact in ordered {
        let line = serde_json::to_string(fact)?;
        debug_assert!(line.is_ascii(), "async fact export must be ASCII-safe");
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SiteId;

    #[test]
    fn export_orders_by_fact_kind() {
        let facts = vec![
            AsyncFact::SyncAlloc { sync_id: SiteId::raw("s1"), kind: "Lock".into() },
            AsyncFact::CoroutineDef {
                func_sym: "worker".into(),
                def_site: SiteId::raw("f:1:1:def"),
                is_async: true,
                is_async_gen: false,
            },
        ];
        let jsonl = to_jsonl(&facts).unwrap();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("coroutine_def"));
        assert!(lines[1].contains("sync_alloc"));
    }

    #[test]
    fn empty_fact_set_exports_empty_string() {
        assert_eq!(to_jsonl(&[]).unwrap(), "");
    }
}
