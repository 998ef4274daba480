//! Slash-path walking over the parsed catalog tree and `File` record
//! extraction.

use crate::record::CatalogRecord;
use roxmltree::Node;

/// Descend from `node` along a slash-separated path of element names.
///
/// At each level the scan runs over `node` and its following siblings in
/// document order; the first element whose tag name equals the current
/// segment is taken. If that was the last segment the element is returned,
/// otherwise the walk recurses into its children with the remaining path.
///
/// Known limitation, kept deliberately: once a name matches there is no
/// backtracking to later siblings, even if the match dead-ends deeper in
/// the path. The catalog paths this crate walks are fixed and unambiguous,
/// so the simpler semantics hold.
pub fn walk<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    let (segment, rest) = match path.split_once('/') {
        Some((seg, rest)) => (seg, Some(rest)),
        None => (path, None),
    };

    let mut current = Some(node);
    while let Some(n) = current {
        if n.is_element() && n.tag_name().name() == segment {
            return match rest {
                None => Some(n),
                Some(rest) => walk(n.first_child()?, rest),
            };
        }
        current = n.next_sibling();
    }
    None
}

/// Extract one [`CatalogRecord`] per `File` child of `files_node`.
///
/// Reads the `FileName`, `FilePath`, `LanguageCode`, and `Architecture`
/// child elements; anything else is ignored. Records missing any of the
/// four fields are dropped. The input tree is not mutated.
pub fn extract_records(files_node: Node<'_, '_>) -> Vec<CatalogRecord> {
    let mut records = Vec::new();

    for file in files_node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "File")
    {
        let mut name = None;
        let mut url = None;
        let mut language = None;
        let mut architecture = None;

        for field in file.children().filter(Node::is_element) {
            let text = field.text().unwrap_or("");
            match field.tag_name().name() {
                "FileName" => name = Some(text),
                "FilePath" => url = Some(text),
                "LanguageCode" => language = Some(text),
                "Architecture" => architecture = Some(text),
                _ => {}
            }
        }

        if let Some(record) = CatalogRecord::from_parts(
            name.unwrap_or(""),
            url.unwrap_or(""),
            language.unwrap_or(""),
            architecture.unwrap_or(""),
        ) {
            records.push(record);
        } else {
            tracing::debug!("dropping incomplete File entry");
        }
    }

    records
}
