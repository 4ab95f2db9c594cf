//! End-to-end extraction runs over fixture trees.

use std::fmt::Write;

use camino::{Utf8Path, Utf8PathBuf};
use xc_core::{AnalyzerConfig, EndpointKey, HttpMethod};
use xc_scanner::{ExtractionCache, Inventory, RunStats, ScanConfig, Scanner, orchestrator};
use xc_ts_parser::ExtractionRules;

fn write(root: &Utf8Path, name: &str, text: &str) -> Utf8PathBuf {
    let path = root.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, text).unwrap();
    path
}

fn config(parallel: bool) -> AnalyzerConfig {
    AnalyzerConfig {
        parallel,
        max_workers: 4,
        cache_enabled: false,
        ..AnalyzerConfig::default()
    }
}

/// Twelve files, above the default sequential threshold, with overlapping
/// endpoints and models.
fn fixture(root: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut paths = Vec::new();
    for i in 0..12 {
        let text = format!(
            "export interface Item{i} {{ id: number; label: string }}\n\
             export const load{i} = () => api.get('/api/items/');\n\
             export const one{i} = (id) => api.get(`/api/items/${{id}}`);\n\
             export const save{i} = () => api.post('/api/items/', {{ label: 'x', rank: {i} }});\n"
        );
        paths.push(write(root, &format!("src/items{i:02}.ts"), &text));
    }
    paths
}

fn run(paths: &[Utf8PathBuf], config: &AnalyzerConfig) -> Inventory {
    orchestrator::run_sequential(paths, &ExtractionRules::usage(), config, None, &RunStats::new())
        .inventory
}

#[test]
fn test_identity_stability_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    write(root, "src/a.ts", "export const a = () => api.get('/items/');\n");
    write(root, "src/b.ts", "\n\nexport const b = () => api.get('/items/');\n");

    let config = ScanConfig::new(root, ExtractionRules::usage()).with_analyzer(config(false));
    let scanner = Scanner::new(config).unwrap();
    let result = scanner.scan().unwrap();

    assert_eq!(result.inventory.endpoint_count(), 1);
    let items = result
        .inventory
        .endpoint(&EndpointKey::new(HttpMethod::Get, "/items/"))
        .unwrap();
    let files: Vec<&str> = items.locations.iter().map(|l| l.file.as_str()).collect();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("src/a.ts"));
    assert!(files[1].ends_with("src/b.ts"));
}

#[test]
fn test_parallel_and_sequential_runs_agree() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    let paths = fixture(root);

    let sequential = run(&paths, &config(false));

    let stats = RunStats::new();
    let parallel = orchestrator::run_parallel(
        &paths,
        &ExtractionRules::usage(),
        &config(true),
        None,
        &stats,
        3,
    )
    .unwrap();

    assert!(parallel.errors.is_empty());
    assert_eq!(stats.snapshot().processed, 12);
    assert_eq!(parallel.inventory, sequential);
    assert!(sequential.model_count() >= 12);
}

#[test]
fn test_merge_is_independent_of_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    let paths = fixture(root);

    let forward = run(&paths, &config(false));
    let mut reversed_paths = paths.clone();
    reversed_paths.reverse();
    let reversed = run(&reversed_paths, &config(false));

    let mut pairwise = run(&paths[..6], &config(false));
    pairwise.merge(run(&paths[6..], &config(false)));

    assert_eq!(forward, reversed);
    assert_eq!(forward, pairwise);
}

#[test]
fn test_timeout_falls_back_and_counts_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();

    let mut source = String::from(
        "export interface Invoice {\n  id: number;\n  total: number;\n}\n\
         export const loadInvoices = () => api.get('/api/invoices/');\n",
    );
    for i in 0..20_000 {
        let _ = writeln!(source, "const value{i} = {{ a: [{i}, {i}, {i}], b: 'x{i}' }};");
    }
    let big = write(root, "src/invoices.ts", &source);
    let small = write(root, "src/health.ts", "api.get('/api/health');\n");

    let config = AnalyzerConfig {
        parse_timeout_seconds: 0.000_001,
        ..config(false)
    };
    let stats = RunStats::new();
    let collected =
        orchestrator::run(&[big, small], &ExtractionRules::usage(), &config, None, &stats).unwrap();

    let snap = stats.snapshot();
    assert!(snap.parse_timeouts >= 1);
    assert_eq!(snap.processed, 2);
    assert_eq!(snap.error_files, 0);
    assert!(collected
        .inventory
        .endpoint(&EndpointKey::new(HttpMethod::Get, "/api/invoices/"))
        .is_some());
    assert!(collected.inventory.model("Invoice").is_some());
}

#[test]
fn test_timeout_on_single_file_counts_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();

    let mut source = String::from("export const load = () => api.get('/api/invoices/');\n");
    for i in 0..20_000 {
        let _ = writeln!(source, "const value{i} = {{ a: [{i}, {i}, {i}], b: 'x{i}' }};");
    }
    let big = write(root, "src/invoices.ts", &source);

    let config = AnalyzerConfig {
        parse_timeout_seconds: 0.000_001,
        ..config(false)
    };
    let stats = RunStats::new();
    let collected =
        orchestrator::run(&[big], &ExtractionRules::usage(), &config, None, &stats).unwrap();

    assert_eq!(stats.snapshot().parse_timeouts, 1);
    assert_eq!(collected.inventory.endpoint_count(), 1);
}

#[test]
fn test_cache_persists_between_scanners() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    write(root, "src/users.ts", "export const load = () => api.get('/api/users');\n");

    let analyzer = AnalyzerConfig {
        cache_enabled: true,
        cache_dir: root.join(".cache"),
        ..config(false)
    };
    let scan = || {
        let config = ScanConfig::new(&root.join("src"), ExtractionRules::usage())
            .with_analyzer(analyzer.clone());
        Scanner::new(config).unwrap().scan().unwrap()
    };

    let first = scan();
    assert_eq!(first.stats.cache_hits, 0);

    let reloaded = ExtractionCache::load(&analyzer.cache_dir).unwrap();
    assert_eq!(reloaded.len(), 1);

    let second = scan();
    assert_eq!(second.stats.cache_hits, 1);
    assert_eq!(first.inventory, second.inventory);
}

#[test]
fn test_identical_files_keep_their_own_component_names() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    let text = "function view() {\n  api.get('/api/items/');\n  return <div />;\n}\n";
    let paths = vec![
        write(root, "src/Alpha.jsx", text),
        write(root, "src/Beta.jsx", text),
    ];

    let cache = ExtractionCache::new();
    let cached = orchestrator::run_sequential(
        &paths,
        &ExtractionRules::usage(),
        &config(false),
        Some(&cache),
        &RunStats::new(),
    )
    .inventory;
    let uncached = run(&paths, &config(false));

    for inventory in [&cached, &uncached] {
        let mut names: Vec<String> = inventory
            .components()
            .map(|c| format!("{}@{}", c.name, c.file.file_name().unwrap()))
            .collect();
        names.sort();
        assert_eq!(names, ["Alpha@Alpha.jsx", "Beta@Beta.jsx"]);

        let items = inventory
            .endpoint(&EndpointKey::new(HttpMethod::Get, "/api/items/"))
            .unwrap();
        let components: Vec<&str> = items.components.iter().map(String::as_str).collect();
        assert_eq!(components, ["Alpha", "Beta"]);
    }
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_excluded_and_test_files_are_not_scanned() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    write(root, "src/api.ts", "api.get('/api/kept');\n");
    write(root, "src/api.test.ts", "api.get('/api/test-only');\n");
    write(root, "node_modules/lib/index.js", "api.get('/api/vendored');\n");
    write(root, "src/types.d.ts", "export interface Ghost { id: number }\n");

    let config = ScanConfig::new(root, ExtractionRules::usage()).with_analyzer(config(false));
    let scanner = Scanner::new(config).unwrap();
    let result = scanner.scan().unwrap();

    assert_eq!(result.stats.processed, 1);
    let urls: Vec<&str> = result.inventory.endpoints().map(|e| e.url.as_str()).collect();
    assert_eq!(urls, ["/api/kept"]);
    assert!(result.inventory.model("Ghost").is_none());
}
