use feed_server::domain::post::NewPost;
use rand::Rng;

const TITLES: &[&str] = &[
    "Morning thought",
    "Quick note",
    "Overheard today",
    "Link dump",
    "Half-baked idea",
    "Late night rambling",
    "Things I learned",
    "Shower thought",
];

const SNIPPETS: &[&str] = &[
    "Spent the afternoon untangling a flaky integration test. The bug was in the test, not the code.",
    "Coffee places near the office, ranked. The one with the broken grinder still wins.",
    "Rewrote the same paragraph four times and ended up with the first version.",
    "A keyboard with good arrow keys is worth more than any productivity app.",
    "Today's lesson: read the error message. The whole error message.",
    "Bookmarking this for later, which means never.",
    "The best migration is the one you don't run on a Friday.",
    "Someone on the train was debugging over the phone, from memory. Respect.",
    "Drafts folder at 47 and counting. One day.",
    "If the demo works on the first try, be suspicious.",
    "Walked past the old office today. The plant in the window is still alive somehow.",
    "Pagination looks trivial until the data stops fitting on one page.",
];

/// One synthesized demo post. The sequence number keeps titles distinct
/// across the run; the published flag is a coin flip so the seeded feed has
/// both visible and draft entries.
pub fn synthesized_post(author_id: i64, sequence: u64) -> NewPost {
    let mut rng = rand::thread_rng();
    let title = TITLES[rng.gen_range(0..TITLES.len())];
    let snippet = SNIPPETS[rng.gen_range(0..SNIPPETS.len())];

    NewPost {
        title: format!("{title} #{sequence}"),
        content: Some(snippet.to_string()),
        published: rng.gen_bool(0.5),
        author_id: Some(author_id),
    }
}
