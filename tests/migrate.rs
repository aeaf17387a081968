use std::fs;
use std::path::{Path, PathBuf};

use jsp2jte::{Migration, Migrator, Parser};
use tempfile::TempDir;

const PREFIX: &str = "@import static example.JteContext.*\n";

struct Workspace {
    _dir: TempDir,
    jsp_root: PathBuf,
    jte_root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let jsp_root = dir.path().join("jsp");
        let jte_root = dir.path().join("jte");
        fs::create_dir_all(&jsp_root).unwrap();
        Self {
            _dir: dir,
            jsp_root,
            jte_root,
        }
    }

    fn jsp(&self, relative: &str, content: &str) -> &Self {
        let path = self.jsp_root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    fn read_jsp(&self, relative: &str) -> String {
        fs::read_to_string(self.jsp_root.join(relative)).unwrap()
    }

    fn read_jte(&self, relative: &str) -> String {
        fs::read_to_string(self.jte_root.join(relative)).unwrap()
    }

    fn migrator(&self) -> Migrator {
        Migrator::new(&self.jsp_root, &self.jte_root, "my:jte")
    }

    fn convert(&self, jsp: &str, jte: &str) -> jsp2jte::Result<Migration> {
        self.convert_with(self.migrator(), jsp, jte)
    }

    fn convert_with(&self, migrator: Migrator, jsp: &str, jte: &str) -> jsp2jte::Result<Migration> {
        migrator.convert_tag_with(jsp, jte, |parser: &mut Parser| {
            parser.set_prefix(PREFIX);
            parser.set_indentation_char(' ');
            parser.set_indentation_count(4);
            parser.set_line_separator("\n");
        })
    }
}

fn exists(path: &Path) -> bool {
    path.exists()
}

#[test]
fn simple_tag() {
    let ws = Workspace::new();
    ws.jsp(
        "simple.tag",
        r#"<%@ tag pageEncoding="UTF-8" %>
<%@ taglib prefix="c" uri="http://java.sun.com/jsp/jstl/core" %>
<%@ attribute name="title" required="true" type="java.lang.String" %>
<%@ attribute name="count" type="int" %>
<div class="simple">
    <h2>${title}</h2>
    <c:if test="${count gt 0}">
        <span><c:out value="${count}"/></span>
    </c:if>
</div>
"#,
    );

    let migration = ws.convert("simple.tag", "tag/simple.jte").unwrap();

    let expected = r#"@import static example.JteContext.*
@param String title
@param int count = 0
<div class="simple">
    <h2>${title}</h2>
    @if(count > 0)
        <span>${count}</span>
    @endif
</div>
"#;
    assert_eq!(ws.read_jte("tag/simple.jte"), expected);
    assert_eq!(migration.jte, expected);
    assert_eq!(migration.jte_file, "tag/simple.jte");
    assert!(!exists(&ws.jsp_root.join("simple.tag")));
}

#[test]
fn simple_tag_with_comment_between_params() {
    let ws = Workspace::new();
    ws.jsp(
        "simple.tag",
        "<%@ attribute name=\"first\" required=\"true\" %>\n\
         <%-- the second one is optional --%>\n\
         <%@ attribute name=\"second\" %>\n\
         <p>${first} ${second}</p>\n",
    );

    ws.convert("simple.tag", "tag/simple.jte").unwrap();

    assert_eq!(
        ws.read_jte("tag/simple.jte"),
        "@import static example.JteContext.*\n\
         @param String first\n\
         <%-- the second one is optional --%>\n\
         @param String second = null\n\
         <p>${first} ${second}</p>\n"
    );
}

#[test]
fn kebab_case_target_is_rejected_before_anything_is_written() {
    let ws = Workspace::new();
    ws.jsp("simple.tag", "<p>simple</p>\n");

    let err = ws.convert("simple.tag", "tag/not-so-simple.jte").unwrap_err();

    assert_eq!(
        err.message,
        "Illegal jte tag name 'tag/not-so-simple.jte'. Tag names should be camel case."
    );
    assert!(!exists(&ws.jte_root));
    assert!(exists(&ws.jsp_root.join("simple.tag")));
}

#[test]
fn two_outputs_after_each_other() {
    let ws = Workspace::new();
    ws.jsp(
        "simple.tag",
        "<span><c:out value=\"${a}\"/><c:out value=\"${b}\" escapeXml=\"false\"/></span>\n",
    );

    ws.convert("simple.tag", "tag/simple.jte").unwrap();

    assert_eq!(
        ws.read_jte("tag/simple.jte"),
        format!("{}<span>${{a}}$unsafe{{b}}</span>\n", PREFIX)
    );
}

#[test]
fn choose_statement() {
    let ws = Workspace::new();
    ws.jsp(
        "simple.tag",
        r#"<%@ attribute name="level" type="int" required="true" %>
<div>
    <c:choose>
        <c:when test="${level eq 1}">
            <b>one</b>
        </c:when>
        <c:when test="${level eq 2}">
            <b>two</b>
        </c:when>
        <c:otherwise>
            <b>many</b>
        </c:otherwise>
    </c:choose>
</div>
"#,
    );

    ws.convert("simple.tag", "tag/simple.jte").unwrap();

    let expected = r#"@import static example.JteContext.*
@param int level
<div>
    @if(level == 1)
        <b>one</b>
    @elseif(level == 2)
        <b>two</b>
    @else
        <b>many</b>
    @endif
</div>
"#;
    assert_eq!(ws.read_jte("tag/simple.jte"), expected);
}

#[test]
fn variable_and_for_each() {
    let ws = Workspace::new();
    ws.jsp(
        "simple.tag",
        r#"<%@ attribute name="items" type="java.util.List" required="true" %>
<c:set var="total" value="${items.size()}"/>
<ul data-total="${total}">
    <c:forEach var="item" items="${items}">
        <li>${item.label}</li>
    </c:forEach>
</ul>
"#,
    );

    ws.convert("simple.tag", "tag/simple.jte").unwrap();

    let expected = r#"@import static example.JteContext.*
@param java.util.List items
!{var total = items.size();}
<ul data-total="${total}">
    @for(var item : items)
        <li>${item.getLabel()}</li>
    @endfor
</ul>
"#;
    assert_eq!(ws.read_jte("tag/simple.jte"), expected);
}

#[test]
fn format_message_parameters_are_flattened() {
    let ws = Workspace::new();
    ws.jsp(
        "simple.tag",
        r#"<%@ taglib prefix="fmt" uri="http://java.sun.com/jsp/jstl/fmt" %>
<p>
    <fmt:message key="greeting">
        <fmt:param value="${user.name}"/>
        <fmt:param value="${count}"/>
    </fmt:message>
</p>
<fmt:message key="title" var="pageTitle"/>
"#,
    );

    ws.convert("simple.tag", "tag/simple.jte").unwrap();

    let expected = r#"@import static example.JteContext.*
<p>
    ${localize("greeting", user.getName(), count)}
</p>
!{var pageTitle = localize("title");}
"#;
    assert_eq!(ws.read_jte("tag/simple.jte"), expected);
}

#[test]
fn usages_are_rewritten_across_the_tree() {
    let ws = Workspace::new();
    ws.jsp(
        "my/simple.tag",
        "<%@ attribute name=\"title\" required=\"true\" %>\n<h1>${title}</h1>\n",
    )
    .jsp(
        "usage.jsp",
        "<my:simple title=\"Hello\"/>\n<my:simpleOther/>\n<my:simple\n    title=\"${page.title}\"/>\n",
    )
    .jsp("tags/box.tag", "<my:simple title=\"a\">ignored body</my:simple>\n")
    .jsp("untouched.jsp", "<p>nothing here</p>\n");

    let migration = ws.convert("my/simple.tag", "tag/my/simple.jte").unwrap();

    assert_eq!(
        ws.read_jsp("usage.jsp"),
        "<my:jte jte=\"tag/my/simple.jte\" title=\"Hello\"/>\n<my:simpleOther/>\n<my:jte jte=\"tag/my/simple.jte\"\n    title=\"${page.title}\"/>\n"
    );
    assert_eq!(
        ws.read_jsp("tags/box.tag"),
        "<my:jte jte=\"tag/my/simple.jte\" title=\"a\">ignored body</my:jte>\n"
    );
    assert_eq!(ws.read_jsp("untouched.jsp"), "<p>nothing here</p>\n");
    assert_eq!(
        ws.read_jte("tag/my/simple.jte"),
        format!("{}@param String title\n<h1>${{title}}</h1>\n", PREFIX)
    );

    assert!(!exists(&ws.jsp_root.join("my/simple.tag")));
    assert_eq!(migration.usages.old_prefix, "<my:simple");
    assert_eq!(migration.usages.total_replacements, 4);
    assert_eq!(migration.usages.deleted.as_deref(), Some("my/simple.tag"));
    let files: Vec<&str> = migration.usages.edits.iter().map(|e| e.file.as_str()).collect();
    assert_eq!(files, vec!["tags/box.tag", "usage.jsp"]);
}

#[test]
fn body_usage_without_attributes_is_rewritten_balanced() {
    let ws = Workspace::new();
    ws.jsp("my/simple.tag", "<div><jsp:doBody/></div>\n")
        .jsp("page.jsp", "<my:simple>\n  <b>hi</b>\n</my:simple>\n");

    let migrator = ws
        .migrator()
        .with_not_converted_tags(vec!["jsp:doBody".to_string()]);
    let migration = ws.convert_with(migrator, "my/simple.tag", "tag/my/simple.jte").unwrap();

    assert_eq!(
        ws.read_jsp("page.jsp"),
        "<my:jte jte=\"tag/my/simple.jte\">\n  <b>hi</b>\n</my:jte>\n"
    );
    assert_eq!(migration.usages.total_replacements, 2);
    assert!(!exists(&ws.jsp_root.join("my/simple.tag")));

    let page = ws.migrator().preview("page.jsp").unwrap();
    assert_eq!(page, "@template.tag.my.simple(content = @`\n  <b>hi</b>\n`)\n");
}

#[test]
fn already_converted_tag_usage_round_trips() {
    let ws = Workspace::new();
    ws.jsp(
        "usage.jsp",
        "<%@ taglib prefix=\"my\" tagdir=\"/WEB-INF/tags/my\" %>\n\
         <my:jte jte=\"tag/my/simple.jte\" title=\"${user.name}\"/>\n\
         <my:jte jte=\"layout/page.jte\">\n\
         \x20   <p>body</p>\n\
         </my:jte>\n",
    );

    ws.convert("usage.jsp", "usage.jte").unwrap();

    assert_eq!(
        ws.read_jte("usage.jte"),
        "@import static example.JteContext.*\n\
         @template.tag.my.simple(title = user.getName())\n\
         @template.layout.page(content = @`\n\
         \x20   <p>body</p>\n\
         `)\n"
    );
}

#[test]
fn not_yet_converted_dependency_fails_without_writing() {
    let ws = Workspace::new();
    ws.jsp("my/simple.tag", "<div>\n    <my:simple-dependency/>\n</div>\n")
        .jsp("usage.jsp", "<my:simple/>\n");

    let err = ws.convert("my/simple.tag", "tag/my/simple.jte").unwrap_err();

    assert_eq!(
        err.message,
        "The tag <my:simple-dependency/> is used by this tag and not converted to jte yet. You should convert <my:simple-dependency/> first. If this is a tag that should be always converted by hand, implement getNotConvertedTags() and add it there."
    );
    assert!(!exists(&ws.jte_root.join("tag/my/simple.jte")));
    assert!(exists(&ws.jsp_root.join("my/simple.tag")));
    assert_eq!(ws.read_jsp("usage.jsp"), "<my:simple/>\n");
}

#[test]
fn allow_listed_dependency_is_kept() {
    let ws = Workspace::new();
    ws.jsp("my/simple.tag", "<div>\n    <my:simple-dependency/>\n</div>\n");

    let migrator = ws
        .migrator()
        .with_not_converted_tags(vec!["my:simple-dependency".to_string()]);
    ws.convert_with(migrator, "my/simple.tag", "tag/my/simple.jte").unwrap();

    assert_eq!(
        ws.read_jte("tag/my/simple.jte"),
        format!("{}<div>\n    <my:simple-dependency/>\n</div>\n", PREFIX)
    );
}

#[test]
fn syntax_error_leaves_tree_untouched() {
    let ws = Workspace::new();
    ws.jsp("my/simple.tag", "<c:if test=\"${a}\">\n<p>open</p>\n")
        .jsp("usage.jsp", "<my:simple/>\n");

    let err = ws.convert("my/simple.tag", "tag/my/simple.jte").unwrap_err();

    assert!(err.code.is_syntax());
    assert_eq!(err.message, "<c:if> is never terminated (line 1)");
    assert!(!exists(&ws.jte_root));
    assert_eq!(ws.read_jsp("usage.jsp"), "<my:simple/>\n");
}

#[test]
fn convert_from_args_derives_target_name() {
    let ws = Workspace::new();
    ws.jsp("my/user-card.tag", "<p>card</p>\n");

    let args = vec![ws.jsp_root.join("my/user-card.tag").display().to_string()];
    let migration = ws.migrator().convert_from_args(&args).unwrap();

    assert_eq!(migration.jsp_file, "my/user-card.tag");
    assert_eq!(migration.jte_file, "tag/my/userCard.jte");
    assert_eq!(ws.read_jte("tag/my/userCard.jte"), "<p>card</p>\n");
}

#[test]
fn preview_writes_nothing() {
    let ws = Workspace::new();
    ws.jsp("simple.tag", "<c:out value=\"${name}\"/>\n");

    let jte = ws.migrator().preview("simple.tag").unwrap();

    assert_eq!(jte, "${name}\n");
    assert!(!exists(&ws.jte_root));
    assert!(exists(&ws.jsp_root.join("simple.tag")));
}

#[test]
fn replace_usages_without_conversion() {
    let ws = Workspace::new();
    ws.jsp("tags/footer.tag", "<footer/>\n")
        .jsp("page.jsp", "<include:footer year=\"2024\"/>\n");

    let rewrite = ws
        .migrator()
        .replace_usages("tags/footer.tag", "tag/footer.jte")
        .unwrap();

    assert_eq!(rewrite.old_prefix, "<include:footer");
    assert_eq!(
        ws.read_jsp("page.jsp"),
        "<my:jte jte=\"tag/footer.jte\" year=\"2024\"/>\n"
    );
    assert!(!exists(&ws.jsp_root.join("tags/footer.tag")));
    assert!(!exists(&ws.jte_root.join("tag/footer.jte")));
}
