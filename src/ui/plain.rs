//! Plain-text rendering of the current page, used by `--print`.

use std::io::Write;

use crate::store::UserStore;

/// Write the current page as an aligned table followed by a page footer.
pub fn write_page<W: Write>(store: &UserStore, out: &mut W) -> std::io::Result<()> {
    let page = store.paginated_users();
    let header = ["ID", "FIRST NAME", "LAST NAME", "EMAIL"];
    let rows: Vec<[String; 4]> = page
        .iter()
        .map(|u| {
            [
                u.id.to_string(),
                u.first_name.clone(),
                u.last_name.clone(),
                u.email.clone(),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 4]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{:<w$}", c, w = w))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    writeln!(out, "{}", line(header))?;
    for row in &rows {
        writeln!(out, "{}", line([row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()]))?;
    }
    writeln!(
        out,
        "page {}/{} ({} matches)",
        store.current_page(),
        store.total_pages(),
        store.filtered_count()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UserDraft;

    #[test]
    fn prints_aligned_page_and_footer() {
        let mut store = UserStore::new();
        store.add(UserDraft::new("Ann", "Lee", "ann@example.com"));
        store.add(UserDraft::new("Bartholomew", "Ng", "b@example.com"));
        let mut out = Vec::new();
        write_page(&store, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID  FIRST NAME   LAST NAME  EMAIL");
        assert_eq!(lines[1], "1   Ann          Lee        ann@example.com");
        assert_eq!(lines[2], "2   Bartholomew  Ng         b@example.com");
        assert_eq!(lines[3], "page 1/1 (2 matches)");
    }
}
