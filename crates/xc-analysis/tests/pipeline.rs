//! End-to-end analysis of a small usage codebase against a small server.

use camino::{Utf8Path, Utf8PathBuf};
use xc_analysis::{AnalysisError, Analyzer};
use xc_core::{AnalyzerConfig, Config};

fn write(root: &Utf8Path, name: &str, text: &str) {
    let path = root.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

const ORDER_PAGE: &str = r"
import React, { useEffect, useState } from 'react';
import axios from 'axios';
import OrderRow from './OrderRow';

export default function OrderPage({ orderId }) {
  const [order, setOrder] = useState(null);
  useEffect(() => {
    axios.get(`/api/orders/${orderId}`).then((r) => setOrder(r.data));
  }, [orderId]);
  const submit = (note) => axios.post('/api/orders', { note, quantity: 2 });
  return <OrderRow order={order} onSubmit={submit} />;
}
";

const ORDER_ROW: &str = r"
export default function OrderRow({ order, onSubmit }) {
  return <li onClick={() => onSubmit('x')}>{order.id}</li>;
}
";

const ROUTES: &str = r"
router.get('/api/orders/:id', (req, res) => {
  res.json({ id: req.params.id });
});

router.post('/api/orders', (req, res) => {
  const { note, quantity } = req.body;
  res.status(201).json({ id: 1 });
});

router.delete('/api/orders/:id', removeOrder);
";

struct Fixture {
    _dir: tempfile::TempDir,
    web: Utf8PathBuf,
    server: Utf8PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap().to_owned();
    let web = root.join("web");
    let server = root.join("server");

    write(&web, "src/pages/OrderPage.jsx", ORDER_PAGE);
    write(&web, "src/pages/OrderRow.jsx", ORDER_ROW);
    write(
        &web,
        "src/api/reports.js",
        "export const loadReport = () => fetch('/api/reports/summary');\n",
    );
    write(&server, "routes/orders.js", ROUTES);

    Fixture {
        _dir: dir,
        web,
        server,
    }
}

fn analyzer() -> Analyzer {
    Analyzer::new(Config {
        analyzer: AnalyzerConfig {
            parallel: false,
            cache_enabled: false,
            ..AnalyzerConfig::default()
        },
        ..Config::default()
    })
    .unwrap()
}

#[test]
fn test_analyze_matches_usage_against_declaration() {
    let fixture = fixture();
    let report = analyzer()
        .analyze(&fixture.web, Some(&fixture.server))
        .unwrap();

    assert_eq!(report.usage.stats.processed, 3);
    assert!(report.usage.error_files.is_empty());
    let declaration = report.declaration.as_ref().unwrap();
    assert_eq!(declaration.stats.processed, 1);

    let record = report.compatibility.as_ref().unwrap();
    assert_eq!(
        record.endpoint_matches["GET /api/orders/{orderId}"].matched_url,
        "/api/orders/:id"
    );
    assert_eq!(
        record.endpoint_matches["POST /api/orders"].matched_url,
        "/api/orders"
    );
    assert!(record.endpoints_only_in_a.contains("GET /api/reports/summary"));
    assert!(record.endpoints_only_in_b.contains("DELETE /api/orders/:id"));

    let order = &record.model_matches["Order"];
    assert_eq!(order.matched, "Order");
    assert!(order.similarity > 0.0);
}

#[test]
fn test_analyze_without_declaration() {
    let fixture = fixture();
    let report = analyzer().analyze(&fixture.web, None).unwrap();

    assert!(report.declaration.is_none());
    assert!(report.compatibility.is_none());
    assert!(report.graph.node_count() >= 5);

    let order = report.usage.inventory.model("Order").unwrap();
    assert!(order.endpoints.contains("/api/orders"));

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["usage"]["inventory"]["endpoints"].is_array());
    assert!(json["graph"]["edges"].is_array());
    assert!(json["compatibility"].is_null());
}

#[test]
fn test_tree_for_component() {
    let fixture = fixture();
    let tree = analyzer().tree(&fixture.web, "OrderPage").unwrap();

    assert!(tree.starts_with("OrderPage\n"));
    assert!(tree.contains("── OrderRow"));
    assert!(tree.contains("── GET /api/orders/{orderId}"));
    assert!(tree.lines().any(|line| line.ends_with("── Order")));
}

#[test]
fn test_tree_for_unknown_component() {
    let fixture = fixture();
    let err = analyzer().tree(&fixture.web, "Checkout").unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownComponent(name) if name == "Checkout"));
}

#[test]
fn test_declaration_root_must_exist() {
    let fixture = fixture();
    let err = analyzer()
        .analyze(&fixture.web, Some(Utf8Path::new("/nonexistent/xcompat/server")))
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Scan { side: "declaration", .. }));
}
