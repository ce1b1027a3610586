// Survey fetch and publish against a local HTTP listener:
//   request paths, form fields, headers, status handling

#![cfg(feature = "network")]

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};

use suave_spatial::{
    publish::{self, Auth, PublishRequest},
    survey::SurveyLocation,
    Error, FeatureTable,
};

/// One request as seen by the listener.
#[derive(Debug)]
struct Recorded {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

/// Canned response: status line tail, extra header lines, body.
struct Reply(&'static str, &'static [&'static str], &'static str);

fn read_request(reader: &mut impl BufRead) -> Recorded {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap().to_string();
    let path = parts.next().unwrap().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() { break }
        let (key, value) = line.split_once(':').unwrap();
        headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
    }

    let mut body = Vec::new();
    let header = |name: &str| headers.iter().find(|(key, _)| key == name).map(|(_, v)| v.clone());
    if let Some(length) = header("content-length") {
        body.resize(length.parse::<usize>().unwrap(), 0);
        reader.read_exact(&mut body).unwrap();
    } else if header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
        loop {
            let mut size = String::new();
            reader.read_line(&mut size).unwrap();
            let size = usize::from_str_radix(size.trim(), 16).unwrap();
            let mut chunk = vec![0; size + 2];
            reader.read_exact(&mut chunk).unwrap();
            if size == 0 { break }
            body.extend_from_slice(&chunk[..size]);
        }
    }

    Recorded { method, path, headers, body: String::from_utf8_lossy(&body).into_owned() }
}

/// Answer one connection per reply, in order. Returns the base URL (with a
/// trailing slash) and a handle yielding the recorded requests.
fn serve(replies: Vec<Reply>) -> (String, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        replies.into_iter()
            .map(|Reply(status, headers, body)| {
                let (mut stream, _) = listener.accept().unwrap();
                let request = read_request(&mut BufReader::new(stream.try_clone().unwrap()));
                let mut response = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n", body.len());
                for header in headers {
                    response.push_str(header);
                    response.push_str("\r\n");
                }
                response.push_str("\r\n");
                response.push_str(body);
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
                request
            })
            .collect()
    });
    (base, handle)
}

fn table() -> FeatureTable {
    FeatureTable::from_csv_bytes(b"a,b\n1,2\n3,4\n").unwrap()
}

#[test]
fn fetch_reads_the_survey_csv() {
    let (base, server) = serve(vec![Reply("200 OK", &["Content-Type: text/csv"], "name,lat,lon\nA,1,2\nB,3,4\n")]);
    let location = SurveyLocation::new(Some(&format!("{base}main/file=ann_trees.csv&views=1")), "ann_trees.csv").unwrap();
    assert_eq!(location.referer(), base);

    let table = location.fetch().unwrap();
    assert_eq!(table.height(), 2);
    assert_eq!(table.text_values("name").unwrap()[1].as_deref(), Some("B"));

    let requests = server.join().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/surveys/ann_trees.csv");
}

#[test]
fn fetch_fails_on_error_status() {
    let (base, server) = serve(vec![Reply("404 Not Found", &[], "no such survey")]);
    let location = SurveyLocation::new(Some(&format!("{base}main")), "missing.csv").unwrap();

    let err = location.fetch().unwrap_err();
    assert!(matches!(err, Error::Source(ref message) if message.contains("404")), "{err}");
    server.join().unwrap();
}

#[test]
fn login_then_upload_with_session_cookie() {
    let (base, server) = serve(vec![
        Reply("200 OK", &["Set-Cookie: sid=abc; Path=/"], "welcome"),
        Reply("200 OK", &[], "stored"),
    ]);
    let auth = Auth::Login { user: "ann".into(), password: "s3cret".into() };
    let request = PublishRequest { survey_name: "trees_2", user: "ann", auth: &auth, referer: &base, dzc: Some("trees.dzc") };

    let outcome = publish::publish(&table(), &request).unwrap();
    assert_eq!(outcome.url, format!("{base}main/file=ann_trees_2.csv"));

    let requests = server.join().unwrap();
    let (login, upload) = (&requests[0], &requests[1]);

    assert_eq!((login.method.as_str(), login.path.as_str()), ("POST", "/"));
    assert_eq!(login.body, "user=ann&pass=s3cret&remember-me=true");
    assert_eq!(login.header("content-type"), Some("application/x-www-form-urlencoded"));
    assert_eq!(login.header("user-agent"), Some("suave user agent"));
    assert_eq!(login.header("referer"), Some(base.as_str()));

    assert_eq!((upload.method.as_str(), upload.path.as_str()), ("POST", "/uploadCSV"));
    assert!(upload.header("content-type").is_some_and(|v| v.starts_with("multipart/form-data; boundary=")));
    assert!(upload.header("cookie").is_some_and(|v| v.contains("sid=abc")));
    assert_eq!(upload.header("user-agent"), Some("suave user agent"));
    assert_eq!(upload.header("referer"), Some(base.as_str()));
    assert!(upload.body.contains(r#"name="file"; filename="trees_2.csv""#));
    assert!(upload.body.contains("text/csv"));
    assert!(upload.body.contains("a,b\n1,2\n3,4\n"));
    assert!(!upload.body.contains("__row_id"));
    assert!(upload.body.contains("name=\"name\"\r\n\r\ntrees_2\r\n"));
    assert!(upload.body.contains("name=\"user\"\r\n\r\nann\r\n"));
    assert!(upload.body.contains("name=\"dzc\"\r\n\r\ntrees.dzc\r\n"));
}

#[test]
fn cookie_auth_uploads_directly() {
    let (base, server) = serve(vec![Reply("200 OK", &[], "stored")]);
    let auth = Auth::Cookie("sid=42".into());
    let request = PublishRequest { survey_name: "trees_3", user: "ann", auth: &auth, referer: &base, dzc: None };

    publish::publish(&table(), &request).unwrap();

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/uploadCSV");
    assert_eq!(requests[0].header("cookie"), Some("sid=42"));
    assert!(!requests[0].body.contains("name=\"dzc\""));
}

#[test]
fn upload_failure_carries_status_reason_and_body() {
    let (base, server) = serve(vec![Reply("500 Internal Server Error", &[], "quota exceeded")]);
    let auth = Auth::Cookie("sid=42".into());
    let request = PublishRequest { survey_name: "trees_4", user: "ann", auth: &auth, referer: &base, dzc: None };

    let err = publish::publish(&table(), &request).unwrap_err();
    assert_eq!(err.to_string(), "[publish] upload failed (500 Internal Server Error): quota exceeded");
    assert!(err.is_recoverable());
    server.join().unwrap();
}

#[test]
fn only_200_counts_as_success() {
    let (base, server) = serve(vec![Reply("201 Created", &[], "")]);
    let auth = Auth::Cookie("sid=42".into());
    let request = PublishRequest { survey_name: "trees_5", user: "ann", auth: &auth, referer: &base, dzc: None };

    let err = publish::publish(&table(), &request).unwrap_err();
    assert!(matches!(err, Error::PublishFailed(ref message) if message.contains("201 Created")), "{err}");
    server.join().unwrap();
}

#[test]
fn rejected_login_stops_before_upload() {
    let (base, server) = serve(vec![Reply("403 Forbidden", &[], "bad password")]);
    let auth = Auth::Login { user: "ann".into(), password: "wrong".into() };
    let request = PublishRequest { survey_name: "trees_6", user: "ann", auth: &auth, referer: &base, dzc: None };

    let err = publish::publish(&table(), &request).unwrap_err();
    assert_eq!(err.to_string(), "[publish] login failed (403 Forbidden): bad password");
    assert_eq!(server.join().unwrap().len(), 1);
}
