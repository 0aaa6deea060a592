//! Inline Glyphs sources shared by the unit and scenario tests

use crate::plist;
use std::fs;
use std::path::{Path, PathBuf};

/// Glyphs 3 source: one Weight axis with masters at 100 and 900, a brace
/// layer on "A", a smart glyph "o.smart" and a glyph "e" using it
pub const GLYPHS3_SOURCE: &str = r#"{
.appVersion = "3260";
.formatVersion = 3;
axes = (
{
name = Weight;
tag = wght;
}
);
classes = (
{
code = "A e";
name = Uppercase;
}
);
familyName = "Bezy Test";
featurePrefixes = (
{
code = "languagesystem DFLT dflt;";
name = Languagesystems;
}
);
features = (
{
code = "pos A A -20;";
tag = kern;
},
{
code = "sub e by e.sc;";
tag = smcp;
}
);
fontMaster = (
{
axesValues = (
100
);
id = m01;
metricValues = (
{
over = 16;
pos = 800;
},
{
over = 16;
pos = 700;
},
{
over = -16;
}
);
name = Light;
},
{
axesValues = (
900
);
id = m02;
metricValues = (
{
over = 16;
pos = 820;
},
{
over = 16;
pos = 720;
},
{
over = -16;
}
);
name = Black;
}
);
glyphs = (
{
glyphname = A;
layers = (
{
layerId = m01;
shapes = (
{
closed = 1;
nodes = (
(0,0,l),
(300,700,l),
(600,0,l)
);
}
);
width = 600;
},
{
anchors = (
{
name = top;
pos = (300,700);
}
);
associatedMasterId = m01;
attr = {
coordinates = (
400
);
};
layerId = "5E2C7A1B-9D3F-4B6A-8C21-0F4E3D2B1A90";
name = "{400}";
shapes = (
{
closed = 1;
nodes = (
(0,0,l),
(320,700,l),
(640,0,l)
);
}
);
width = 640;
},
{
layerId = m02;
shapes = (
{
closed = 1;
nodes = (
(0,0,l),
(350,700,l),
(700,0,l)
);
}
);
width = 700;
},
{
associatedMasterId = m02;
layerId = "0B7F4E2A-6C1D-4E3B-9A85-2D6C8F1E3B47";
name = "Mar 3 24, 10:00";
width = 700;
}
);
unicode = 65;
},
{
glyphname = o.smart;
layers = (
{
layerId = m01;
partSelection = {
weight = 1;
};
shapes = (
{
closed = 1;
nodes = (
(400,0,o),
(500,100,o),
(500,250,cs),
(500,400,o),
(400,500,o),
(250,500,cs),
(100,500,o),
(0,400,o),
(0,250,cs),
(0,100,o),
(100,0,o),
(250,0,cs)
);
}
);
width = 500;
},
{
associatedMasterId = m01;
layerId = "C41D2E3F-1111-4A2B-8C3D-4E5F60718293";
name = Bold;
partSelection = {
weight = 2;
};
shapes = (
{
closed = 1;
nodes = (
(0,0,l),
(0,500,l),
(500,500,l),
(500,0,l)
);
}
);
width = 500;
},
{
layerId = m02;
partSelection = {
weight = 1;
};
shapes = (
{
closed = 1;
nodes = (
(0,0,l),
(0,520,l),
(540,520,l),
(540,0,l)
);
}
);
width = 540;
},
{
associatedMasterId = m02;
layerId = "D52E3F40-2222-4B3C-9D4E-5F6071829304";
name = Bold;
partSelection = {
weight = 2;
};
shapes = (
{
closed = 1;
nodes = (
(0,0,l),
(0,540,l),
(560,540,l),
(560,0,l)
);
}
);
width = 560;
}
);
partsSettings = (
{
bottomValue = 0;
name = weight;
topValue = 100;
}
);
},
{
glyphname = e;
layers = (
{
layerId = m01;
shapes = (
{
piece = {
weight = 50;
};
ref = o.smart;
}
);
width = 500;
},
{
layerId = m02;
shapes = (
{
piece = {
weight = 50;
};
ref = o.smart;
}
);
width = 540;
}
);
unicode = 101;
}
);
metrics = (
{
type = ascender;
},
{
type = "cap height";
},
{
type = baseline;
}
);
unitsPerEm = 1000;
versionMajor = 1;
versionMinor = 0;
}
"#;

/// Glyphs 2 source with the implicit Weight/Width/Custom axes and one
/// kerning pair on the Bold master
pub const GLYPHS2_SOURCE: &str = r#"{
.appVersion = "1342";
classes = (
{
code = "a b";
name = Lower;
}
);
familyName = "Bezy Two";
features = (
{
code = "sub a by b;";
name = liga;
}
);
fontMaster = (
{
ascender = 750;
capHeight = 700;
id = M1;
weightValue = 100;
xHeight = 500;
},
{
ascender = 750;
capHeight = 700;
id = M2;
weight = Bold;
weightValue = 700;
xHeight = 520;
}
);
glyphs = (
{
glyphname = a;
layers = (
{
anchors = (
{
name = top;
position = "{250, 500}";
}
);
layerId = M1;
paths = (
{
closed = 1;
nodes = (
"100 0 LINE",
"100 500 LINE",
"400 500 LINE",
"400 0 LINE"
);
}
);
width = 500;
},
{
associatedMasterId = M1;
layerId = "7A3B9C1D-0E2F-4A5B-8C6D-7E8F9A0B1C2D";
name = "{400}";
paths = (
{
closed = 1;
nodes = (
"90 0 LINE",
"90 510 LINE",
"420 510 LINE",
"420 0 LINE"
);
}
);
width = 520;
},
{
layerId = M2;
paths = (
{
closed = 1;
nodes = (
"80 0 LINE",
"80 520 LINE",
"440 520 LINE",
"440 0 LINE"
);
}
);
width = 540;
}
);
rightKerningGroup = a;
unicode = 0061;
},
{
glyphname = b;
layers = (
{
components = (
{
name = a;
transform = "{1, 0, 0, 1, 20, 0}";
}
);
layerId = M1;
width = 500;
},
{
components = (
{
name = a;
}
);
layerId = M2;
width = 540;
}
);
unicode = 0062;
}
);
kerning = {
M2 = {
"@MMK_L_a" = {
b = -30;
};
};
};
unitsPerEm = 1000;
}
"#;

/// Glyphs 3 source with Weight and Width axes; glyph "n" has a brace
/// layer that only spells out its Weight coordinate
pub const TWO_AXIS_SOURCE: &str = r#"{
.appVersion = "3260";
.formatVersion = 3;
axes = (
{
name = Weight;
tag = wght;
},
{
name = Width;
tag = wdth;
}
);
familyName = "Bezy Wide";
fontMaster = (
{
axesValues = (
100,
50
);
id = m01;
name = "Light Condensed";
},
{
axesValues = (
900,
50
);
id = m02;
name = "Black Condensed";
},
{
axesValues = (
100,
100
);
id = m03;
name = Light;
}
);
glyphs = (
{
glyphname = n;
layers = (
{
layerId = m01;
width = 500;
},
{
associatedMasterId = m01;
attr = {
coordinates = (
400
);
};
layerId = "9F1E2D3C-4B5A-4697-8877-665544332211";
name = "{400}";
width = 540;
},
{
layerId = m02;
width = 600;
},
{
layerId = m03;
width = 560;
}
);
unicode = 110;
}
);
unitsPerEm = 1000;
versionMajor = 1;
versionMinor = 0;
}
"#;

pub fn write_fixture(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

/// File names the package fixture uses for its glyphs
pub const PACKAGE_FILES: [(&str, &str); 3] =
    [("A", "A_.glyph"), ("o.smart", "o.smart.glyph"), ("e", "e.glyph")];

/// Split [`GLYPHS3_SOURCE`] into a `.glyphspackage` directory
pub fn write_package_fixture(dir: &Path, name: &str) -> PathBuf {
    let (_, spans) = plist::parse_with_spans(GLYPHS3_SOURCE).unwrap();
    let glyphs = &spans.entries["glyphs"];

    let start = glyphs.value.start - "glyphs = ".len();
    let end = glyphs.value.end + ";\n".len();
    let fontinfo = format!("{}{}", &GLYPHS3_SOURCE[..start], &GLYPHS3_SOURCE[end..]);

    let path = dir.join(name);
    fs::create_dir_all(path.join("glyphs")).unwrap();
    fs::write(path.join("fontinfo.plist"), fontinfo).unwrap();
    fs::write(path.join("order.plist"), "(\nA,\no.smart,\ne\n)\n").unwrap();
    for ((_, file), item) in PACKAGE_FILES.iter().zip(&glyphs.items) {
        let text = format!("{}\n", &GLYPHS3_SOURCE[item.clone()]);
        fs::write(path.join("glyphs").join(file), text).unwrap();
    }
    fs::write(path.join("UIState.plist"), "{\ndisplayStrings = (\nAe\n);\n}\n").unwrap();
    path
}
