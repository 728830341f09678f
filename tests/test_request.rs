use docroot::http::parser::parse_request_line;
use docroot::http::request::Request;

#[test]
fn test_request_path_is_prefix_of_target() {
    let req = parse_request_line(b"GET /a/b.txt?x=1#frag HTTP/1.1").unwrap();
    assert!(req.target.starts_with(&req.path));
    assert!(!req.path.is_empty());
}

#[test]
fn test_request_clone_equality() {
    let req = Request {
        line: "GET / HTTP/1.1".to_string(),
        method: "GET".to_string(),
        target: "/".to_string(),
        version: "HTTP/1.1".to_string(),
        path: "/".to_string(),
    };

    assert_eq!(req.clone(), req);
}
