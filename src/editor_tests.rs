use super::*;

fn editor_with(text: &str) -> TagEditor {
    TagEditor::with_text(text, TagPatterns::default())
}

fn type_text(editor: &mut TagEditor, text: &str) {
    for ch in text.chars() {
        if ch == '\n' {
            editor.insert_paragraph_break();
        } else {
            editor.insert_char(ch);
        }
    }
}

fn dump(editor: &TagEditor) -> String {
    dump_document(editor.document())
}

fn select_range(editor: &mut TagEditor, from: TextPosition, to: TextPosition) {
    let document = editor.document();
    let selection = Selection::new(
        resolve(document, from, Affinity::Before),
        resolve(document, to, Affinity::Before),
    );
    editor.select(selection);
}

fn caret(editor: &TagEditor) -> TextPosition {
    editor.cursor_position()
}

fn assert_consistent(editor: &TagEditor) {
    let patterns = editor.patterns();
    let document = editor.document();
    if document.paragraphs.len() == 1 {
        assert!(
            document.has_text(),
            "a lone empty paragraph should have become the empty state"
        );
    }
    for paragraph in &document.paragraphs {
        for (idx, run) in paragraph.runs.iter().enumerate() {
            assert!(!run.is_empty(), "empty run left in {paragraph:?}");
            if idx > 0 {
                assert!(
                    !(run.is_plain() && paragraph.runs[idx - 1].is_plain()),
                    "adjacent plain runs in {paragraph:?}"
                );
            }
            if let RunStyle::Tagged(kind) = run.style {
                assert_eq!(patterns.classify_word(&run.text), Some(kind), "{paragraph:?}");
                let (start, end) = paragraph.run_span(idx).unwrap();
                assert!(!paragraph.char_before(start).is_some_and(is_word_char));
                assert!(!paragraph.char_at(end).is_some_and(is_word_char));
            }
        }

        let text = paragraph.text();
        for span in words(&text) {
            let word = char_slice(&text, span.start, span.end);
            if patterns.word_matches_tag_pattern(word) {
                let found = paragraph.locate(span.start, Affinity::After).unwrap();
                assert!(
                    paragraph.runs[found.run].is_tagged(),
                    "`{word}` should be tagged in {paragraph:?}"
                );
                assert_eq!(
                    paragraph.run_span(found.run),
                    Some((span.start, span.end))
                );
            }
        }
    }
}

#[test]
fn typing_a_hashtag_then_space_formats_it() {
    let mut editor = TagEditor::default();
    type_text(&mut editor, "#hello ");

    let paragraphs = &editor.document().paragraphs;
    assert_eq!(paragraphs.len(), 1);
    assert_eq!(
        paragraphs[0].runs,
        vec![
            Run::tagged("#hello", TagKind::Hashtag),
            Run::plain(" "),
        ]
    );
    assert_eq!(caret(&editor), TextPosition::new(0, 7));
    assert_consistent(&editor);
}

#[test]
fn tag_is_formatted_while_it_is_typed() {
    let mut editor = TagEditor::default();
    type_text(&mut editor, "#h");
    assert_eq!(dump(&editor), "[#h]");
    type_text(&mut editor, "i");
    assert_eq!(dump(&editor), "[#hi]");
    assert_eq!(editor.cursor_pointer(), CursorPointer::new(0, 0, 3));
}

#[test]
fn deleting_the_only_character_enters_the_empty_state() {
    let mut editor = TagEditor::default();
    editor.insert_char('#');
    assert_eq!(dump(&editor), "\"#\"");

    editor.backspace();
    assert!(editor.is_empty());
    assert!(editor.document().paragraphs.is_empty());

    editor.insert_char('a');
    assert_eq!(editor.document().paragraphs.len(), 1);
    assert_eq!(editor.text(), "a");
}

#[test]
fn merging_paragraphs_unformats_touching_tags() {
    let mut editor = editor_with("see #tag1\n#tag2 more");
    insta::assert_snapshot!(dump(&editor), @r#"
    "see " [#tag1]
    [#tag2] " more"
    "#);

    editor.set_cursor(TextPosition::new(1, 0));
    editor.backspace();

    assert_eq!(dump(&editor), "\"see #tag1#tag2 more\"");
    assert_eq!(caret(&editor), TextPosition::new(0, 9));
    assert_consistent(&editor);
}

#[test]
fn forward_delete_at_paragraph_end_merges_the_next_paragraph() {
    let mut editor = editor_with("#one\ntwo");
    editor.set_cursor(TextPosition::new(0, 4));
    editor.delete();

    assert_eq!(dump(&editor), "[#onetwo]");
    assert_eq!(caret(&editor), TextPosition::new(0, 4));
}

#[test]
fn clearing_one_paragraph_of_several_leaves_a_placeholder() {
    let mut editor = editor_with("first\nhi #a bye");
    select_range(&mut editor, TextPosition::new(1, 0), TextPosition::new(1, 9));
    editor.backspace();

    insta::assert_snapshot!(dump(&editor), @r#"
    "first"
    <br>
    "#);
    assert_eq!(caret(&editor), TextPosition::new(1, 0));

    type_text(&mut editor, "#b");
    assert_eq!(dump(&editor), "\"first\"\n[#b]");
}

#[test]
fn deleting_the_whole_document_enters_the_empty_state() {
    let mut editor = editor_with("hi #a bye");
    editor.select_all();
    editor.backspace();
    assert!(editor.is_empty());

    editor.insert_char('x');
    assert_eq!(editor.document().paragraphs.len(), 1);
    assert_eq!(editor.text(), "x");
}

#[test]
fn deleting_everything_across_paragraphs_enters_the_empty_state() {
    let mut editor = editor_with("#a\n\nb @c");
    editor.select_all();
    editor.delete();
    assert!(editor.is_empty());
    assert_eq!(caret(&editor), TextPosition::default());
}

#[test]
fn pasting_formats_every_tag() {
    let mut editor = editor_with("abcd");
    editor.set_cursor(TextPosition::new(0, 2));
    editor.paste("go #x and #y now");

    assert_eq!(editor.text(), "abgo #x and #y nowcd");
    assert_eq!(dump(&editor), "\"abgo \" [#x] \" and \" [#y] \" nowcd\"");
    assert_eq!(caret(&editor), TextPosition::new(0, 18));
    assert_consistent(&editor);
}

#[test]
fn pasting_lines_splits_paragraphs() {
    let mut editor = TagEditor::default();
    editor.paste("#one\r\ntwo @bob\rthree");

    insta::assert_snapshot!(dump(&editor), @r#"
    [#one]
    "two " [@bob]
    "three"
    "#);
    assert_eq!(caret(&editor), TextPosition::new(2, 5));
}

#[test]
fn pasting_over_a_selection_replaces_it() {
    let mut editor = editor_with("see #old now");
    select_range(&mut editor, TextPosition::new(0, 4), TextPosition::new(0, 8));
    editor.paste("#new");

    assert_eq!(dump(&editor), "\"see \" [#new] \" now\"");
    assert_eq!(caret(&editor), TextPosition::new(0, 8));
}

#[test]
fn pasting_into_the_middle_of_a_paragraph_keeps_the_tail() {
    let mut editor = editor_with("start #end");
    editor.set_cursor(TextPosition::new(0, 5));
    editor.paste(" @a\n#b");

    insta::assert_snapshot!(dump(&editor), @r#"
    "start " [@a]
    [#b] " " [#end]
    "#);
    assert_eq!(caret(&editor), TextPosition::new(1, 2));
}

#[test]
fn deleting_the_space_before_a_tag_unformats_it() {
    let mut editor = editor_with("word #tag");
    assert_eq!(dump(&editor), "\"word \" [#tag]");

    editor.set_cursor(TextPosition::new(0, 5));
    editor.backspace();
    assert_eq!(dump(&editor), "\"word#tag\"");

    editor.insert_char(' ');
    assert_eq!(dump(&editor), "\"word \" [#tag]");
    assert_consistent(&editor);
}

#[test]
fn joining_two_tags_unformats_both() {
    let mut editor = editor_with("#tag1 #tag2");
    editor.set_cursor(TextPosition::new(0, 6));
    editor.backspace();

    assert_eq!(dump(&editor), "\"#tag1#tag2\"");
    assert_eq!(caret(&editor), TextPosition::new(0, 5));
}

#[test]
fn forward_delete_joins_a_tag_with_the_following_word() {
    let mut editor = editor_with("#tag now");
    editor.set_cursor(TextPosition::new(0, 4));
    editor.delete();

    assert_eq!(dump(&editor), "[#tagnow]");
    assert_eq!(caret(&editor), TextPosition::new(0, 4));
}

#[test]
fn typing_a_space_inside_a_tag_splits_it() {
    let mut editor = editor_with("#hello");
    editor.set_cursor(TextPosition::new(0, 3));
    editor.insert_char(' ');

    assert_eq!(dump(&editor), "[#he] \" llo\"");
    assert_eq!(caret(&editor), TextPosition::new(0, 4));
}

#[test]
fn typing_before_a_tag_unformats_it() {
    let mut editor = editor_with("#tag");
    editor.set_cursor(TextPosition::new(0, 0));
    editor.insert_char('x');
    assert_eq!(dump(&editor), "\"x#tag\"");

    editor.backspace();
    assert_eq!(dump(&editor), "[#tag]");
}

#[test]
fn typing_a_space_before_a_tag_keeps_it() {
    let mut editor = editor_with("#tag");
    editor.set_cursor(TextPosition::new(0, 0));
    editor.insert_char(' ');
    assert_eq!(dump(&editor), "\" \" [#tag]");
    assert_eq!(caret(&editor), TextPosition::new(0, 1));
}

#[test]
fn removing_the_sigil_unformats_the_tag() {
    let mut editor = editor_with("#tag");
    editor.set_cursor(TextPosition::new(0, 1));
    editor.backspace();
    assert_eq!(dump(&editor), "\"tag\"");
}

#[test]
fn shortening_a_tag_keeps_it_formatted_until_it_stops_matching() {
    let mut editor = editor_with("#a1 x");
    editor.set_cursor(TextPosition::new(0, 3));
    editor.backspace();
    assert_eq!(dump(&editor), "[#a] \" x\"");
    editor.backspace();
    assert_eq!(dump(&editor), "\"# x\"");
}

#[test]
fn hashtag_without_letters_stays_plain() {
    let mut editor = TagEditor::default();
    type_text(&mut editor, "#123 @123 #1a");
    assert_eq!(dump(&editor), "\"#123 \" [@123] \" \" [#1a]");
}

#[test]
fn mention_followed_by_punctuation() {
    let mut editor = TagEditor::default();
    type_text(&mut editor, "@bob, hi");
    assert_eq!(dump(&editor), "[@bob] \", hi\"");
}

#[test]
fn no_break_space_separates_words() {
    let mut editor = TagEditor::default();
    type_text(&mut editor, "hi\u{a0}#tag");

    let runs = &editor.document().paragraphs[0].runs;
    assert_eq!(
        runs,
        &vec![
            Run::plain("hi\u{a0}"),
            Run::tagged("#tag", TagKind::Hashtag),
        ]
    );
}

#[test]
fn splitting_inside_a_tag_reformats_both_halves() {
    let mut editor = editor_with("#hello");
    editor.set_cursor(TextPosition::new(0, 3));
    editor.insert_paragraph_break();

    assert_eq!(dump(&editor), "[#he]\n\"llo\"");
    assert_eq!(caret(&editor), TextPosition::new(1, 0));
}

#[test]
fn splitting_before_a_tag_keeps_it() {
    let mut editor = editor_with("see #tag");
    editor.set_cursor(TextPosition::new(0, 4));
    editor.insert_paragraph_break();

    assert_eq!(dump(&editor), "\"see \"\n[#tag]");
}

#[test]
fn splitting_a_word_can_create_a_tag() {
    let mut editor = editor_with("ab#cd");
    editor.set_cursor(TextPosition::new(0, 2));
    editor.insert_paragraph_break();

    assert_eq!(dump(&editor), "\"ab\"\n[#cd]");
}

#[test]
fn splitting_the_empty_document_creates_two_placeholders() {
    let mut editor = TagEditor::default();
    editor.insert_paragraph_break();

    assert_eq!(dump(&editor), "<br>\n<br>");
    assert_eq!(caret(&editor), TextPosition::new(1, 0));

    type_text(&mut editor, "#a");
    assert_eq!(dump(&editor), "<br>\n[#a]");
}

#[test]
fn backspace_over_an_empty_paragraph() {
    let mut editor = TagEditor::default();
    type_text(&mut editor, "a\n");
    assert_eq!(dump(&editor), "\"a\"\n<br>");

    editor.backspace();
    assert_eq!(dump(&editor), "\"a\"");
    editor.backspace();
    assert!(editor.is_empty());
}

#[test]
fn partial_delete_across_paragraphs_joins_head_and_tail() {
    let mut editor = editor_with("one #alpha\nmiddle\n#beta two");
    select_range(&mut editor, TextPosition::new(0, 6), TextPosition::new(2, 3));
    editor.delete();

    assert_eq!(editor.text(), "one #ata two");
    assert_eq!(dump(&editor), "\"one \" [#ata] \" two\"");
    assert_eq!(caret(&editor), TextPosition::new(0, 6));
    assert_consistent(&editor);
}

#[test]
fn backwards_selection_is_deleted_the_same_way() {
    let mut editor = editor_with("keep #x drop");
    select_range(&mut editor, TextPosition::new(0, 12), TextPosition::new(0, 7));
    assert!(editor.selection().is_backwards());
    editor.backspace();

    assert_eq!(dump(&editor), "\"keep \" [#x]");
}

#[test]
fn typing_over_a_selection_replaces_it() {
    let mut editor = editor_with("see #old now");
    select_range(&mut editor, TextPosition::new(0, 4), TextPosition::new(0, 8));
    type_text(&mut editor, "#new");

    assert_eq!(dump(&editor), "\"see \" [#new] \" now\"");
}

#[test]
fn enter_over_a_selection_replaces_it() {
    let mut editor = editor_with("a #b c");
    select_range(&mut editor, TextPosition::new(0, 1), TextPosition::new(0, 5));
    editor.insert_paragraph_break();

    assert_eq!(dump(&editor), "\"a\"\n\"c\"");
}

#[test]
fn cut_returns_the_selected_text() {
    let mut editor = editor_with("x #one\ntwo");
    select_range(&mut editor, TextPosition::new(0, 2), TextPosition::new(1, 1));
    assert_eq!(editor.cut(), "#one\nt");
    assert_eq!(dump(&editor), "\"x wo\"");
}

#[test]
fn explicit_intents_match_the_wrappers() {
    let mut editor = TagEditor::default();
    let selection = editor.apply(EditIntent::InsertChar {
        at: Selection::default(),
        ch: '@',
    });
    let selection = editor.apply(EditIntent::InsertChar {
        at: selection,
        ch: 'z',
    });
    assert_eq!(dump(&editor), "[@z]");

    let selection = editor.apply(EditIntent::DeleteCollapsed {
        at: selection.head,
        direction: Direction::Backward,
    });
    assert_eq!(dump(&editor), "\"@\"");
    assert!(selection.is_collapsed());
}

#[test]
fn delete_range_with_equal_positions_is_a_no_op() {
    let mut editor = editor_with("#a b");
    let pointer = editor.cursor_pointer();
    editor.apply(EditIntent::DeleteRange {
        start: pointer,
        end: pointer,
    });
    assert_eq!(dump(&editor), "[#a] \" b\"");
}

#[test]
fn out_of_range_positions_are_clamped() {
    let mut editor = editor_with("#a");
    editor.apply(EditIntent::InsertChar {
        at: Selection::collapsed(CursorPointer::new(7, 3, 99)),
        ch: 'b',
    });
    assert_eq!(dump(&editor), "[#ab]");
}

#[test]
fn collapsed_delete_without_a_neighbour_is_a_no_op() {
    let mut editor = editor_with("#a");
    editor.set_cursor(TextPosition::new(0, 0));
    editor.backspace();
    editor.set_cursor(TextPosition::new(0, 2));
    editor.delete();
    assert_eq!(dump(&editor), "[#a]");
}

#[test]
fn disabled_kinds_are_not_formatted() {
    let only_hashtags = TagPatterns {
        hashtags: true,
        mentions: false,
    };
    let mut editor = TagEditor::with_text("@bob #x", only_hashtags);
    assert_eq!(dump(&editor), "\"@bob \" [#x]");

    editor.set_patterns(TagPatterns::default());
    assert_eq!(dump(&editor), "[@bob] \" \" [#x]");
}

#[test]
fn new_editor_repairs_an_inconsistent_document() {
    let document = Document::new().with_paragraphs(vec![Paragraph {
        runs: vec![
            Run::tagged("#a", TagKind::Hashtag),
            Run::tagged("#b", TagKind::Hashtag),
            Run::plain(" "),
            Run::tagged("@c", TagKind::Hashtag),
            Run::plain(" #d"),
        ],
    }]);
    let editor = TagEditor::new(document);
    assert_eq!(dump(&editor), "\"#a#b \" [@c] \" \" [#d]");
    assert_eq!(
        editor.document().paragraphs[0].runs[1].style,
        RunStyle::Tagged(TagKind::Mention)
    );
}

#[test]
fn typed_text_round_trips() {
    let mut editor = TagEditor::default();
    let text = "hey @ann, see #rust_2024 and #42\nnext #line";
    type_text(&mut editor, text);
    assert_eq!(editor.text(), text);
    assert_eq!(editor.document().tags().len(), 3);
    assert_consistent(&editor);
}

#[test]
fn scripted_edits_keep_the_document_consistent() {
    const ALPHABET: [char; 10] = ['a', 'b', '#', '@', ' ', '\u{a0}', '1', '.', '_', 'z'];
    let mut editor = TagEditor::default();
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    for _ in 0..4000 {
        let roll = next() % 100;
        match roll {
            0..=54 => {
                let ch = ALPHABET[(next() % ALPHABET.len() as u64) as usize];
                editor.insert_char(ch);
            }
            55..=64 => {
                editor.backspace();
            }
            65..=71 => {
                editor.delete();
            }
            72..=76 => {
                editor.insert_paragraph_break();
            }
            77..=82 => {
                editor.move_left(false);
            }
            83..=87 => {
                editor.move_right(false);
            }
            88..=91 => {
                editor.move_left(true);
                editor.move_left(true);
            }
            92..=94 => {
                editor.move_up(next() % 2 == 0);
            }
            95..=97 => {
                editor.paste("x #y\n@z w");
            }
            _ => {
                editor.select_all();
                editor.backspace();
            }
        }
        assert_consistent(&editor);

        let mut normalized = editor.document().clone();
        normalized.normalize();
        assert_eq!(&normalized, editor.document());
    }
}

fn long_tagged_line(tags: usize) -> String {
    (0..tags)
        .map(|i| if i % 2 == 0 { format!("#t{i}") } else { format!("@m{i}") })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn typing_into_a_long_paragraph_only_touches_the_edited_word() {
    let mut editor = editor_with(&long_tagged_line(2000));
    assert_eq!(editor.document().tags().len(), 2000);

    editor.set_cursor(TextPosition::new(0, 0));
    editor.insert_char('x');
    assert_eq!(editor.document().tags().len(), 1999);
    assert!(editor.text().starts_with("x#t0 @m1"));

    editor.backspace();
    assert_eq!(editor.document().tags().len(), 2000);
    assert_eq!(editor.document(), editor_with(&editor.text()).document());
}

#[test]
fn pasting_many_tags_into_a_long_paragraph() {
    let line = long_tagged_line(1000);
    let clip = format!("{line} ");
    // Start of the word nearest the middle; the line is ASCII.
    let middle = line[..line.len() / 2].rfind(' ').unwrap() + 1;
    let mut editor = editor_with(&line);
    editor.set_cursor(TextPosition::new(0, middle));
    editor.paste(&clip);

    assert_eq!(editor.document().tags().len(), 2000);
    assert_eq!(caret(&editor), TextPosition::new(0, middle + clip.len()));
    assert_eq!(editor.document(), editor_with(&editor.text()).document());
}

#[test]
fn pasting_glues_onto_the_neighbouring_words() {
    let mut editor = editor_with("ab #cd ef");
    editor.set_cursor(TextPosition::new(0, 6));
    editor.paste("gh x @y #z");
    assert_eq!(editor.text(), "ab #cdgh x @y #z ef");
    assert_eq!(dump(&editor), "\"ab \" [#cdgh] \" x \" [@y] \" \" [#z] \" ef\"");
    assert_consistent(&editor);
}
