use verse_stream::corpus::Corpus;

/// Small cross-volume corpus in the double-space separator variant.
pub const SAMPLE: &str = "\
Genesis 1:1  In the beginning God created the heaven and the earth.
Genesis 1:2  And the earth was without form, and void; and darkness was upon the face of the deep.
Genesis 1:3  And God said, Let there be light: and there was light.
Genesis 2:1  Thus the heavens and the earth were finished, and all the host of them.
Exodus 1:1  Now these are the names of the children of Israel, which came into Egypt.
Malachi 4:2  But unto you that fear my name shall the Sun of righteousness arise.
Matthew 5:9  Blessed are the peacemakers: for they shall be called the children of God.
John 11:35  Jesus wept.
1 Nephi 3:7  I will go and do the things which the Lord hath commanded.
2 Nephi 29:1  And now behold, my people, ye are a stiffnecked people.
Doctrine and Covenants 76:22  And now, after the many testimonies which have been given of him, this is the testimony, last of all.
Moses 1:39  For behold, this is my work and my glory.
";

pub fn sample_corpus() -> Corpus {
    Corpus::parse(SAMPLE)
}

/// Synthetic single-book corpus with deterministic, varied verse lengths.
pub fn long_corpus(chapters: u32, verses_per_chapter: u32) -> Corpus {
    let mut text = String::with_capacity(64 * 1024);
    for chapter in 1..=chapters {
        for verse in 1..=verses_per_chapter {
            let words = 6 + ((chapter * 7 + verse * 3) % 30) as usize;
            let body = "and it came to pass ".repeat(words / 5 + 1);
            text.push_str(&format!("Alma {}:{}  {}\n", chapter, verse, body.trim()));
        }
    }
    Corpus::parse(&text)
}
