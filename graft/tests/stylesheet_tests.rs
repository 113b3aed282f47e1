use facet_testhelpers::test;
use graft::{ArenaDocument, DocumentTree, Dom, ImportStyleOptions, Query, SheetRef};
use indextree::NodeId;

fn dom(html: &str) -> Dom<ArenaDocument> {
    Dom::new(ArenaDocument::parse(html)).unwrap()
}

#[test]
fn test_create_then_append() {
    let mut dom = dom("<html><head><title>t</title></head><body></body></html>");
    let sheet = dom
        .import_style("body{padding:10px}", ImportStyleOptions::new())
        .unwrap();

    let head = dom.roots().head;
    assert_eq!(dom.tree().parent(&sheet), Some(head));
    assert_eq!(dom.tree().children(&head).last(), Some(&sheet));
    assert_eq!(dom.tree().text_content(&sheet), "body{padding:10px}");

    let same = dom
        .import_style("p{margin:0}", ImportStyleOptions::node(sheet).appending())
        .unwrap();
    assert_eq!(same, sheet);
    assert_eq!(
        dom.tree().text_content(&sheet),
        "body{padding:10px}p{margin:0}"
    );
    assert_eq!(
        dom.tree().outer_html(sheet),
        "<style>body{padding:10px}p{margin:0}</style>"
    );
}

#[test]
fn test_append_without_sheet_creates_one() {
    let mut dom = dom("<html><head></head><body></body></html>");
    let first = dom.import_style("a{}", ImportStyleOptions::append()).unwrap();
    let second = dom.import_style("b{}", ImportStyleOptions::append()).unwrap();
    assert_ne!(first, second);
    assert_eq!(dom.tree().children(&dom.roots().head).len(), 2);
    assert_eq!(dom.tree().text_content(&second), "b{}");
}

#[test]
fn test_selector_reference() {
    let mut dom = dom(
        r#"<html><head><style id="theme">:root{--a:1}</style><style id="other"></style></head><body></body></html>"#,
    );
    let sheet = dom
        .import_style(
            ":root{--b:2}",
            ImportStyleOptions::sheet("style#theme").appending(),
        )
        .unwrap();
    assert_eq!(dom.tree().attribute(&sheet, "id").as_deref(), Some("theme"));
    assert_eq!(dom.tree().text_content(&sheet), ":root{--a:1}:root{--b:2}");
    assert_eq!(dom.tree().children(&dom.roots().head).len(), 2);

    let replaced = dom
        .import_style("x{}", ImportStyleOptions::sheet(SheetRef::from("#other")))
        .unwrap();
    assert_eq!(dom.tree().attribute(&replaced, "id").as_deref(), Some("other"));
    assert_eq!(dom.tree().text_content(&replaced), "x{}");
}

#[test]
fn test_unsupported_selector_creates_sheet() {
    let mut dom = dom("<html><head><style></style></head><body></body></html>");
    let sheet = dom
        .import_style("a{}", ImportStyleOptions::sheet("style:first-of-type"))
        .unwrap();
    assert_eq!(dom.tree().children(&dom.roots().head).len(), 2);
    assert_eq!(dom.tree().text_content(&sheet), "a{}");
}

#[test]
fn test_node_reference_outside_head() {
    let mut dom = dom("<html><head></head><body><style>old</style></body></html>");
    let body = dom.roots().body.unwrap();
    let inline = dom.tree().first_element_child(&body).unwrap();
    let sheet = dom
        .import_style("new", ImportStyleOptions::node(inline))
        .unwrap();
    assert_eq!(sheet, inline);
    assert_eq!(dom.tree().to_html(), "<style>new</style>");
    assert!(dom.tree().children(&dom.roots().head).is_empty());
}

#[test]
fn test_custom_query_collaborator() {
    /// Always resolves to the last child of `<head>`.
    struct LastInHead;
    impl Query<ArenaDocument> for LastInHead {
        fn query(&self, tree: &ArenaDocument, _selector: &str) -> Option<NodeId> {
            tree.children(&tree.head()?).last().copied()
        }
    }

    let mut dom =
        dom("<html><head><style>a{}</style></head><body></body></html>").with_query(LastInHead);
    let sheet = dom
        .import_style("b{}", ImportStyleOptions::sheet("anything").appending())
        .unwrap();
    assert_eq!(dom.tree().text_content(&sheet), "a{}b{}");
}
