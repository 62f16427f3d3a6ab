//! Shared fixtures for the integration suites.
#![allow(dead_code)]

/// Initializes test logging; repeated calls across tests are fine.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The canonical two-book document: the chapter level mixes `verse` and
/// `bloup` children, whose interleaving only the document order decides.
pub const BASE_TEI: &str = r##"<TEI xmlns="http://www.tei-c.org/ns/1.0">
    <teiHeader>
        <refsDecl>
            <citeStructure unit="book" match="//body/div" use="@n">
                <citeStructure unit="chapter" match="div" use="position()" delim=" ">
                    <citeStructure unit="verse" match="div" use="position()" delim=":"/>
                    <citeStructure unit="bloup" match="l" use="position()" delim="#"/>
                </citeStructure>
            </citeStructure>
        </refsDecl>
    </teiHeader>
    <text>
    <body>
    <div n="Luke">
        <div>
            <div>Text</div>
            <div>Text 2</div>
            <l>Text 3</l>
        </div>
    </div>
    <div n="Mark">
        <div>
            <div>Text A</div>
            <div>Text B</div>
            <l>Text C</l>
            <div>Text D</div>
        </div>
    </div>
    </body>
    </text>
    </TEI>"##;

/// Two declared trees over the same body; `nums` is the default.
pub const MULTI_TREE: &str = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
    <teiHeader>
        <refsDecl n="nums" default="true">
            <citeStructure unit="book" match="//body/div" use="@n"/>
        </refsDecl>
        <refsDecl n="alpha">
            <citeStructure unit="book" match="//body/div" use="@xml:id"/>
        </refsDecl>
    </teiHeader>
    <text>
    <body>
        <div xml:id="div-a1" n="I"><p>Lorem ipsum dolor sit amet.</p></div>
        <div xml:id="div-002" n="1"><p>Consectetur adipiscing elit.</p></div>
        <div xml:id="div-xyz" n="A"><p>Sed do eiusmod tempor.</p></div>
        <div xml:id="div-004" n="4"><p>Ut labore et dolore.</p></div>
        <div xml:id="div-v5" n="V"><p>Magna aliqua.</p></div>
    </body>
    </text>
    </TEI>"#;
