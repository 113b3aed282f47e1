use divan::{Bencher, black_box};
use graft::{
    ArenaDocument, AttributeSpec, DocumentTree, Dom, ImportStyleOptions, Position, StyleMap,
};

fn main() {
    divan::main();
}

fn list_dom(items: usize) -> Dom<ArenaDocument> {
    let mut html = String::from("<html><head></head><body><ul>");
    for i in 0..items {
        html.push_str(&format!("<li class=\"item\">{i}</li>"));
    }
    html.push_str("</ul></body></html>");
    Dom::new(ArenaDocument::parse(&html)).unwrap()
}

#[divan::bench(args = [10, 100, 1000])]
fn create_and_append(bencher: Bencher, n: usize) {
    bencher.bench_local(|| {
        let mut dom = Dom::new(ArenaDocument::new()).unwrap();
        for i in 0..n {
            let attrs = AttributeSpec::new()
                .with("data-index", i as u32)
                .with("style", StyleMap::new().with("width", 100).with("zIndex", 2));
            let node = dom.create("div", Some(attrs.into()), None).unwrap();
            dom.insert(&node, None, Position::BeforeEnd).unwrap();
        }
        black_box(dom);
    });
}

#[divan::bench(args = [10, 100, 1000])]
fn prepend_each(bencher: Bencher, n: usize) {
    bencher.bench_local(|| {
        let mut dom = list_dom(0);
        let list = dom.tree().first_element_child(&dom.roots().body.unwrap()).unwrap();
        for _ in 0..n {
            let node = dom.create("li", None, None).unwrap();
            dom.prepend(&node, Some(&list)).unwrap();
        }
        black_box(dom);
    });
}

#[divan::bench(args = [10, 100, 1000])]
fn replace_every_item(bencher: Bencher, n: usize) {
    bencher
        .with_inputs(|| list_dom(n))
        .bench_local_values(|mut dom| {
            let list = dom.tree().first_element_child(&dom.roots().body.unwrap()).unwrap();
            for item in dom.tree().children(&list) {
                let node = dom.create("li", None, None).unwrap();
                dom.replace(&node, Some(&item)).unwrap();
            }
            black_box(dom);
        });
}

#[divan::bench(args = [100, 1000])]
fn empty_list(bencher: Bencher, n: usize) {
    bencher
        .with_inputs(|| list_dom(n))
        .bench_local_values(|mut dom| {
            let list = dom.tree().first_element_child(&dom.roots().body.unwrap()).unwrap();
            dom.empty(&list);
            black_box(dom);
        });
}

#[divan::bench]
fn parse_snippet(bencher: Bencher) {
    let mut dom = list_dom(0);
    bencher.bench_local(|| {
        let node = dom
            .parse(black_box(
                r#"<article class="card"><h2>Title</h2><p>Body <a href="/x">link</a></p></article>"#,
            ))
            .unwrap();
        black_box(node);
    });
}

#[divan::bench]
fn import_style_append(bencher: Bencher) {
    bencher.bench_local(|| {
        let mut dom = list_dom(0);
        let sheet = dom
            .import_style(".a{color:red}", ImportStyleOptions::new())
            .unwrap();
        for _ in 0..50 {
            dom.import_style(".b{color:blue}", ImportStyleOptions::node(sheet).appending())
                .unwrap();
        }
        black_box(dom);
    });
}

#[divan::bench]
fn query_stylesheet_selector(bencher: Bencher) {
    let mut dom = list_dom(500);
    dom.import_style("x{}", ImportStyleOptions::new()).unwrap();
    bencher.bench_local(|| {
        let sheet = dom
            .import_style("y{}", ImportStyleOptions::sheet("head > style"))
            .unwrap();
        black_box(sheet);
    });
}
