//! Integration tests over real-world document shapes.
//!
//! Each clean document must parse without warnings, regenerate identically
//! through markup, survive pretty printing, and reach a JSON fixpoint.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use relaxml::serial::{to_json, to_markup, to_markup_with_options, WriteOptions};
use relaxml::{parse_json, parse_str, parse_str_with_options, Document, NodeType, ParseOptions};

fn parse_and_roundtrip(input: &str) -> Document {
    let doc = parse_str(input);
    assert!(doc.warnings.is_empty(), "warnings: {:?}", doc.warnings);
    assert_eq!(doc.check_invariants(), Ok(()));

    let markup = to_markup(&doc);
    let again = parse_str(&markup);
    assert!(again.warnings.is_empty(), "warnings: {:?}", again.warnings);
    assert_eq!(to_markup(&again), markup, "markup changed on second pass");

    let pretty = to_markup_with_options(&doc, &WriteOptions::default().pretty(true));
    assert_eq!(to_markup(&parse_str(&pretty)), markup, "pretty output changed content");

    let json = to_json(&doc);
    let from_json = parse_json(&json);
    assert!(from_json.warnings.is_empty(), "warnings: {:?}", from_json.warnings);
    assert_eq!(to_json(&from_json), json, "JSON changed on second pass");

    doc
}

fn count_elements(doc: &Document, name: &str) -> usize {
    doc.descendants(doc.root())
        .filter(|&id| doc.node_type(id) == NodeType::Element && doc.node_name(id) == Some(name))
        .count()
}

// --- Atom / RSS ---

#[test]
fn test_atom_feed() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Feed</title>
  <link href="http://example.org/"/>
  <updated>2025-12-13T18:30:02Z</updated>
  <author>
    <name>John Doe</name>
  </author>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <entry>
    <title>Atom-Powered Robots Run Amok</title>
    <link href="http://example.org/2003/12/13/atom03"/>
    <updated>2025-12-13T18:30:02Z</updated>
    <summary>Some text.</summary>
  </entry>
</feed>"#;

    let doc = parse_and_roundtrip(xml);
    let root = doc.root_element().unwrap();
    assert_eq!(doc.node_name(root), Some("feed"));
    assert_eq!(doc.attribute(root, "xmlns"), Some("http://www.w3.org/2005/Atom"));
    let author = doc.child_element(root, "author").unwrap();
    assert_eq!(doc.text_content(author), "John Doe");
}

#[test]
fn test_rss_feed_to_json() {
    let xml = r#"<rss version="2.0">
  <channel>
    <title>Example RSS</title>
    <item><title>First</title><link>http://example.org/1</link></item>
    <item><title>Second &amp; last</title><link>http://example.org/2</link></item>
  </channel>
</rss>"#;

    let doc = parse_and_roundtrip(xml);
    assert_eq!(
        to_json(&doc),
        r#"{"$version":2.0,"channel":{"title":"Example RSS","item":[{"title":"First","link":"http://example.org/1"},{"title":"Second & last","link":"http://example.org/2"}]}}"#
    );
}

// --- SVG ---

#[test]
fn test_svg_document() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg"
     viewBox="0 0 100 100"
     width="100" height="100">
  <defs>
    <linearGradient id="grad1" x1="0%" y1="0%" x2="100%" y2="0%">
      <stop offset="0%" style="stop-color:rgb(255,255,0);stop-opacity:1"/>
      <stop offset="100%" style="stop-color:rgb(255,0,0);stop-opacity:1"/>
    </linearGradient>
  </defs>
  <circle cx="50" cy="50" r="40" fill="url(#grad1)"/>
  <text x="50" y="55" text-anchor="middle" fill="white">SVG</text>
  <!-- A comment in SVG -->
  <rect x="10" y="10" width="80" height="80" fill="none" stroke="black"/>
</svg>"#;

    let doc = parse_and_roundtrip(xml);
    let root = doc.root_element().unwrap();
    assert_eq!(doc.node_name(root), Some("svg"));
    assert_eq!(doc.attribute(root, "width"), Some("100"));
    assert_eq!(count_elements(&doc, "stop"), 2);
    let text = doc.child_element(root, "text").unwrap();
    assert_eq!(doc.attribute(text, "text-anchor"), Some("middle"));
}

// --- XHTML ---

#[test]
fn test_xhtml_document() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN"
  "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en">
  <head>
    <meta http-equiv="Content-Type" content="text/html; charset=UTF-8"/>
    <title>Test Page</title>
  </head>
  <body>
    <h1>Hello, World!</h1>
    <p>This is a <em>test</em> page with &amp; entities.</p>
    <ul>
      <li>Item 1</li>
      <li>Item 2</li>
      <li>Item 3</li>
    </ul>
  </body>
</html>"#;

    let doc = parse_and_roundtrip(xml);
    let top: Vec<_> = doc.children(doc.root()).map(|id| doc.node_type(id)).collect();
    assert_eq!(
        top,
        vec![NodeType::Declaration, NodeType::Unknown, NodeType::Element]
    );
    let root = doc.root_element().unwrap();
    assert_eq!(doc.attribute(root, "xml:lang"), Some("en"));
    assert_eq!(count_elements(&doc, "li"), 3);
    assert!(to_json(&doc).contains(r#""li":["Item 1","Item 2","Item 3"]"#));
}

#[test]
fn test_html_with_void_elements() {
    let html = "<html><body><p>one<br>two<br>three</p><img src=logo.png alt=Logo><hr></body></html>";
    let opts = ParseOptions::default().html_void_elements();
    let doc = parse_str_with_options(html, &opts);
    assert!(doc.warnings.is_empty(), "{:?}", doc.warnings);
    assert_eq!(
        to_markup(&doc),
        "<html><body><p>one<br />two<br />three</p><img src=\"logo.png\" alt=\"Logo\" /><hr /></body></html>"
    );

    // without the void list every <br> swallows what follows
    let doc = parse_str(html);
    assert!(!doc.warnings.is_empty());
}

// --- Maven POM ---

#[test]
fn test_maven_pom() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0
           http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>my-app</artifactId>
  <version>1.0-SNAPSHOT</version>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.13.2</version>
      <scope>test</scope>
    </dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin>
        <artifactId>maven-compiler-plugin</artifactId>
        <configuration>
          <source>11</source>
          <target>11</target>
        </configuration>
      </plugin>
    </plugins>
  </build>
</project>"#;

    let doc = parse_and_roundtrip(xml);
    let root = doc.root_element().unwrap();
    assert_eq!(doc.node_name(root), Some("project"));
    assert!(doc
        .attribute(root, "xsi:schemaLocation")
        .unwrap()
        .contains('\n'));
    let deps = doc.child_element(root, "dependencies").unwrap();
    let dep = doc.child_element(deps, "dependency").unwrap();
    let version = doc.child_element(dep, "version").unwrap();
    assert_eq!(doc.text_content(version), "4.13.2");
}

// --- Android Manifest ---

#[test]
fn test_android_manifest() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
          package="com.example.app">
  <uses-permission android:name="android.permission.INTERNET"/>
  <application
      android:label="My App"
      android:icon="@mipmap/ic_launcher">
    <activity android:name=".MainActivity" android:exported="true">
      <intent-filter>
        <action android:name="android.intent.action.MAIN"/>
        <category android:name="android.intent.category.LAUNCHER"/>
      </intent-filter>
    </activity>
  </application>
</manifest>"#;

    let doc = parse_and_roundtrip(xml);
    let root = doc.root_element().unwrap();
    assert_eq!(doc.attribute(root, "package"), Some("com.example.app"));
    let app = doc.child_element(root, "application").unwrap();
    assert_eq!(doc.attribute(app, "android:label"), Some("My App"));
}

// --- Edge cases ---

#[test]
fn test_cdata_and_entities_mixed() {
    let xml = "<root><![CDATA[<not & parsed>]]> and &lt;escaped&gt; &#x41;&#66;</root>";
    let doc = parse_and_roundtrip(xml);
    let root = doc.root_element().unwrap();
    assert_eq!(doc.text_content(root), "<not & parsed> and <escaped> AB");
    assert_eq!(
        to_markup(&doc),
        "<root><![CDATA[<not & parsed>]]> and &lt;escaped&gt; AB</root>"
    );
}

#[test]
fn test_deeply_nested() {
    let depth = 5_000;
    let mut xml = String::new();
    for i in 0..depth {
        xml.push_str(&format!("<d{i}>"));
    }
    xml.push_str("leaf");
    for i in (0..depth).rev() {
        xml.push_str(&format!("</d{i}>"));
    }
    let doc = parse_str(&xml);
    assert!(doc.warnings.is_empty());
    assert_eq!(to_markup(&doc), xml);
    assert_eq!(to_json(&parse_json(&to_json(&doc))), to_json(&doc));
}

#[test]
fn test_unicode_content() {
    let xml = "<données langue=\"日本語\"><élément>Ünïcödé ✓ 🦀</élément></données>";
    let doc = parse_and_roundtrip(xml);
    let root = doc.root_element().unwrap();
    assert_eq!(doc.node_name(root), Some("données"));
    assert_eq!(
        to_json(&doc),
        r#"{"$langue":"日本語","élément":"Ünïcödé ✓ 🦀"}"#
    );
}

#[test]
fn test_empty_elements_and_self_closing() {
    let doc = parse_and_roundtrip("<root><a/><b></b><c   /><d x=\"\"/></root>");
    assert_eq!(
        to_markup(&doc),
        "<root><a /><b /><c /><d x=\"\" /></root>"
    );
    assert_eq!(to_json(&doc), r#"{"a":"","b":"","c":"","d":{"$x":""}}"#);
}

#[test]
fn test_config_driven_json_conventions() {
    let opts: ParseOptions =
        toml::from_str("json_attribute_prefix = \"@\"\njson_text_field = \"value\"").unwrap();
    let doc = relaxml::parse_json_with_options(r#"{"item":{"@id":3,"value":"x"}}"#, &opts);
    assert!(doc.warnings.is_empty());
    assert_eq!(to_markup(&doc), "<unknown><item id=\"3\">x</item></unknown>");
}
