use chrono::{TimeZone, Utc};
use news_digest::digest::{nice_date, nice_time};
use news_digest::render_digest;
use news_digest::types::Post;

fn post() -> Post {
    Post {
        time: Utc.with_ymd_and_hms(2024, 3, 5, 21, 5, 0).unwrap(),
        blog: "Fish & Chips".to_string(),
        title: "<Breaking> news".to_string(),
        author: "O'Brien \"Bob\"".to_string(),
        link: "https://example.com/?a=1&b=\"2\"".to_string(),
        body: "<p>Already <em>clean</em> markup</p>".to_string(),
    }
}

#[test]
fn test_dates_drop_leading_zero() {
    let morning = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 0).unwrap();
    assert_eq!(nice_date(morning), "5 March 2024");
    assert_eq!(nice_time(morning), "9:07&thinsp;am");

    let evening = Utc.with_ymd_and_hms(2024, 11, 20, 22, 30, 0).unwrap();
    assert_eq!(nice_date(evening), "20 November 2024");
    assert_eq!(nice_time(evening), "10:30&thinsp;pm");

    let first_of_october = Utc.with_ymd_and_hms(2024, 10, 10, 10, 0, 0).unwrap();
    assert_eq!(nice_date(first_of_october), "10 October 2024");
    assert_eq!(nice_time(first_of_october), "10:00&thinsp;am");
}

#[test]
fn test_document_shell() {
    let html = render_digest(&[]);
    assert!(html.starts_with("<html>"));
    assert!(html.contains("<title>THE DAILY NEWS</title>"));
    assert!(html.trim_end().ends_with("</html>"));
    assert!(!html.contains("<article>"));
}

#[test]
fn test_article_fields_escaped_body_kept() {
    let html = render_digest(&[post()]);
    assert!(html.contains("<h1><a href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\">&lt;Breaking&gt; news</a></h1>"));
    assert!(html.contains("By O'Brien \"Bob\" for <i>Fish &amp; Chips</i>, on 5 March 2024 at 9:05&thinsp;pm."));
    assert!(html.contains("<p>Already <em>clean</em> markup</p>"));
}

#[test]
fn test_articles_follow_post_order() {
    let mut later = post();
    later.title = "Later".to_string();
    later.time = Utc.with_ymd_and_hms(2024, 3, 6, 8, 0, 0).unwrap();

    let html = render_digest(&[post(), later]);
    assert_eq!(html.matches("<article>").count(), 2);
    let first = html.find("&lt;Breaking&gt;").unwrap();
    let second = html.find(">Later<").unwrap();
    assert!(first < second);
}
