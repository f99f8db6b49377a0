//! Content of the curriculum vitae.

use std::error::Error;
use std::num::NonZeroUsize;

use cv_document::assembler::{
    add_aligned_text, add_plain_text, add_space, add_text, Assembler, ColumnSplit,
};
use cv_document::fonts::DEFAULT_FONT_FAMILY_NAME;
use cv_document::model::{
    ContentBlock, Document, HorizontalAlignment, Metadata, PageGeometry, PageNote, Pagination,
    Permissions, Text,
};
use cv_document::richtext::Span;
use cv_document::style::{FontFace, StyleRef, TextStyle};
use genpdf::style::Color;

/// File name of the generated document inside the temporary directory.
pub const OUTPUT_FILE_NAME: &str = "Philip Niedertscheider CV.pdf";

const TITLE_COLOR: Color = Color::Rgb(36, 101, 144);
const LINK_COLOR: Color = Color::Rgb(0, 0, 255);
const TPPDF_URL: &str = "https://github.com/techprimate/TPPDF";
const SOURCE_URL: &str = "https://github.com/philprime/cv";
const GRID_COLUMNS: usize = 4;

struct Styles {
    title: StyleRef,
    subtitle: StyleRef,
    heading: StyleRef,
    heading2: StyleRef,
    heading2_regular: StyleRef,
    heading3: StyleRef,
    footer: StyleRef,
}

impl Styles {
    fn register(document: &mut Document) -> Result<Self, Box<dyn Error>> {
        let face = || FontFace::new(DEFAULT_FONT_FAMILY_NAME);
        Ok(Self {
            title: document
                .register_style(TextStyle::new("Title", face(), 28).with_color(TITLE_COLOR))?,
            subtitle: document.register_style(TextStyle::new("Subtitle", face(), 10))?,
            heading: document.register_style(TextStyle::new("Heading", face().bold(), 14))?,
            heading2: document.register_style(TextStyle::new("Heading 2", face().bold(), 12))?,
            heading2_regular: document
                .register_style(TextStyle::new("Heading 2 Regular", face(), 12))?,
            heading3: document.register_style(TextStyle::new("Heading 3", face().bold(), 10))?,
            footer: document.register_style(TextStyle::new("Footer", face().italic(), 8))?,
        })
    }
}

struct Experience<'a> {
    company: Option<&'a str>,
    role: &'a str,
    from: &'a str,
    to: Option<&'a str>,
    responsibilities: &'a [&'a str],
}

struct Education<'a> {
    institution: &'a str,
    from: u16,
    to: u16,
    program: &'a str,
}

/// Builds the complete CV document.
pub fn build() -> Result<Document, Box<dyn Error>> {
    let body = TextStyle::new("Body", FontFace::new(DEFAULT_FONT_FAMILY_NAME), 10);
    let mut document = Document::new(PageGeometry::default(), body)?;
    document.set_metadata(Metadata {
        title: "Curriculum Vitae of Philip Niedertscheider".to_string(),
        author: "Philip Niedertscheider".to_string(),
        subject: "Professional profile of Philip Niedertscheider showcasing previous experiences and skillset".to_string(),
        keywords: ["Curriculum Vitae", "CV", "Resume", "Mobile", "App", "Developer"]
            .map(String::from)
            .to_vec(),
        permissions: Permissions {
            printing: true,
            copying: true,
        },
    });

    let styles = Styles::register(&mut document)?;
    let assembler = Assembler::new(&styles.heading);

    document.set_footer(
        PageNote::new(&styles.footer)
            .with_line(vec![
                Span::new(
                    "This curriculum vitae is a showcase of using my PDF generator framework ",
                ),
                Span::new("TPPDF").link(TPPDF_URL, LINK_COLOR),
                Span::new("."),
            ])
            .with_line(vec![
                Span::new("The full source code is available at "),
                Span::new("github.com/philprime/cv").link(SOURCE_URL, LINK_COLOR),
                Span::new("."),
            ]),
    );
    let body_style = document.body_style().clone();
    document.set_pagination(Pagination::new("{page} of {total}", &body_style));

    add_title(&mut document, &styles);

    assembler.add_header(&mut document, "Profile");
    add_plain_text(&mut document, PROFILE);

    assembler.add_header(&mut document, "Professional Experience");
    for experience in EXPERIENCES {
        add_experience(&mut document, &assembler, &styles, experience)?;
    }

    assembler.add_header(&mut document, "Skills");
    for (name, skills) in SKILLSETS {
        add_text(&mut document, *name, &styles.heading3);
        assembler.add_bullet_list(&mut document, skills.iter().copied());
    }

    assembler.add_header(&mut document, "Academic Education");
    for education in EDUCATION {
        add_education(&mut document, &assembler, &styles, education)?;
    }

    let columns = NonZeroUsize::new(GRID_COLUMNS).ok_or("grid needs at least one column")?;

    assembler.add_header(&mut document, "Languages");
    assembler.add_multi_column_grid(&mut document, LANGUAGES, columns);

    assembler.add_header(&mut document, "Other Qualifications & Achievements");
    assembler.add_bullet_list(&mut document, QUALIFICATIONS.iter().copied());

    assembler.add_header(&mut document, "Personal Interests");
    assembler.add_multi_column_grid(&mut document, INTERESTS, columns);

    Ok(document)
}

fn add_title(document: &mut Document, styles: &Styles) {
    add_aligned_text(
        document,
        "Philip Karl Niedertscheider",
        &styles.title,
        HorizontalAlignment::Center,
    );
    add_space(document, 4.0);
    add_aligned_text(
        document,
        CONTACTS.join(" \u{2022} "),
        &styles.subtitle,
        HorizontalAlignment::Center,
    );
    add_space(document, 10.0);
}

fn add_experience(
    document: &mut Document,
    assembler: &Assembler,
    styles: &Styles,
    experience: &Experience<'_>,
) -> Result<(), Box<dyn Error>> {
    let left = match experience.company {
        Some(company) => vec![
            ContentBlock::text(Text::styled(company, &styles.heading2)),
            ContentBlock::text(Text::styled(experience.role, &styles.heading3)),
        ],
        None => vec![ContentBlock::text(Text::styled(
            experience.role,
            &styles.heading2,
        ))],
    };

    let period = match experience.to {
        Some(to) => format!("{} \u{2014} {}", experience.from, to),
        None => experience.from.to_string(),
    };
    let right = vec![ContentBlock::text(Text::styled(
        period,
        &styles.heading2_regular,
    ))];

    assembler.add_two_column_entry(document, left, right, ColumnSplit::new(0.6)?);
    assembler.add_bullet_list(document, experience.responsibilities.iter().copied());
    add_space(document, 8.0);
    Ok(())
}

fn add_education(
    document: &mut Document,
    assembler: &Assembler,
    styles: &Styles,
    education: &Education<'_>,
) -> Result<(), Box<dyn Error>> {
    let left = vec![ContentBlock::text(Text::styled(
        education.institution,
        &styles.heading2,
    ))];
    let right = vec![ContentBlock::text(Text::styled(
        format!("{} \u{2014} {}", education.from, education.to),
        &styles.heading2_regular,
    ))];

    assembler.add_two_column_entry(document, left, right, ColumnSplit::new(0.8)?);
    add_plain_text(document, education.program);
    add_space(document, 4.0);
    Ok(())
}

const CONTACTS: [&str; 4] = [
    "phil@techprimate.com",
    "philprime.dev",
    "linkedin.com/in/philipniedertscheider",
    "github.com/philprime",
];

const PROFILE: &str = "Highly skilled and passionate software developer with over 10 years of experience specializing in mobile app development, distributed back-end development, and deployment process automation. Proven track record of leading teams, founding startups, and managing related administrative responsibilities of building companies. Strongly motivated to deliver excellence, with a keen focus on clean, solution-oriented work and clear communication. Proficient at economic thinking, with a robust background in both technical and business domains. Self-taught and continuously learning, with a strong advocation for open-source software, especially as the founder and lead maintainer of TPPDF, a Swift framework with over 700 stars on GitHub.";

const EXPERIENCES: &[Experience<'static>] = &[
    Experience {
        company: Some("kula app GmbH"),
        role: "Founder, Managing Director, CTO",
        from: "July 2022",
        to: Some("Present"),
        responsibilities: &[
            "Led the development of a fully automated app deployment system, to combine user data, code-generation and proprietary automation technologies to manage individualized apps at scale, while reducing app deployment time from weeks to days.",
            "Managed all aspects of cloud infrastructure, backend software, and automation technology while overseeing strategic and economic aspects of the startup.",
            "Developed scalable, secure mobile apps with deep expertise in Swift, SwiftUI and UIKit.",
            "Strong background in mobile app security, backed by academic research and extensive hands-on experience.",
            "Continuously optimized cloud infrastructure to handle increasing loads using containerisation, cloud orchestration (Kubernetes, AWS) and monitoring solutions (Grafana, Prometheus), without compromising performance, availability or security, following along best practices (AWS Well-Architectured Framework Review, WAFR).",
            "Led implementation of Continuous Integration and Continuous Delivery (CI/CD) pipelines using GitHub Actions, integrating automated testing and deployment processes.",
            "Applied LLMs like OpenAI\u{2019}s GPT API to make the app-building process accessible to non-technical users.",
            "Active contributor and lead maintainer of multiple open-source frameworks, including founding and leading the publicly-funded platform OnLaunch, built as an web application (Next.JS) with its native clients written for Android (Kotlin), Flutter (Dart) and iOS (Swift).",
            "Proficient in breaking down complex problems into smaller, manageable work packages to implement a collaborative, autonomous work environment, empowering team members to achieve goals independently, iteratively and in parallel, while providing mentorship and advice.",
            "Experienced in managing projects within small, dynamic teams where frequent changes required a high degree of flexibility.",
            "Collaborated with non-technical roles such as sales, marketing, and customer support to align technical solutions with business objectives, while also developing internal tools to enhance organisational efficiency.",
            "Taught non-technical employees complex technical concepts and supported them in learning new technologies.",
        ],
    },
    Experience {
        company: Some("techprimate GmbH"),
        role: "Founder, Managing Director, CTO",
        from: "August 2022",
        to: Some("Present"),
        responsibilities: &[
            "Management of cloud hosting solutions (email, websites)",
            "Research and development lead for applications for iOS and macOS (Swift)",
            "Design and implementation of back-end software (Node.JS, Typescript)",
            "Consultant for mobile app development strategies and architectures",
            "Lead-maintainer of Free Open Source Software (FOSS) projects written in Swift",
            "Setup and maintenance of Continuous Integration/Continuous Deployment (CI/CD) processes",
        ],
    },
    Experience {
        company: Some("WolfVision GmbH"),
        role: "Senior iOS/macOS Developer",
        from: "August 2020",
        to: Some("September 2022"),
        responsibilities: &[
            "Research and development of cross-platform applications for Apple platforms (iOS/macOS)",
            "Refactoring of individual iOS and macOS apps into a shared, clean-architecture using the VIPER pattern",
            "Setup and management of Continuous Integration/Continuous Deployment infrastructure using GitLab Runner with self-hosted infrastructure",
            "Planning and mentoring for software architecture design",
        ],
    },
    Experience {
        company: Some("techprimate GmbH & Co. KG"),
        role: "Founder, CTO",
        from: "July 2020",
        to: Some("August 2022"),
        responsibilities: &[
            "Research and development lead for applications for iOS and macOS (Swift)",
            "Design and implementation of back-end software (Node.JS, Typescript)",
            "Consultant for mobile app development",
            "Lead-maintainer of Free Open Source Software (FOSS) projects written in Swift",
            "Setup and maintenance of Continuous Integration/Continuous Deployment (CI/CD) processes",
        ],
    },
    Experience {
        company: Some("fusonic GmbH"),
        role: "Software Developer Intern",
        from: "July 2020",
        to: Some("August 2020"),
        responsibilities: &[
            "Development of back-end applications (ASP.NET) using REST and gRPC",
            "Research, analysis and presentation of application performance tracking using Sentry",
            "Collaborating with a team of developers using agile methods (SCRUM)",
        ],
    },
    Experience {
        company: Some("techprimate GmbH & Co. KG"),
        role: "Founder, Managing Director, CTO",
        from: "July 2018",
        to: Some("August 2020"),
        responsibilities: &[
            "Technical co-founder and managing director of mobile app development agency",
            "Product development and project management team lead (CTO)",
            "Research and development lead for applications for iOS and macOS (Swift)",
            "Design and implementation of back-end software (Node.JS, Typescript)",
            "Introduction and lead of project management (SCRUM)",
            "Customer dialogue and contract negotiations",
            "Infrastructure management (Docker)",
            "Lead maintainer of Free Open Source Software (FOSS) projects",
            "Setup and maintenance of Continuous Integration/Continuous Deployment (CI/CD) processes",
            "Establishment and legal management of an Austrian limited liability corporation (GmbH)",
        ],
    },
    Experience {
        company: Some("Christian Niedertscheider Systemplan"),
        role: "System Administrator",
        from: "June 2017",
        to: Some("December 2022"),
        responsibilities: &[
            "System and server infrastructure management",
            "Planning and implementation of IT processes",
            "Technical administration and support",
        ],
    },
    Experience {
        company: Some("Austrian Red Cross"),
        role: "Paramedic (Compulsory Civilian Service)",
        from: "September 2016",
        to: Some("July 2017"),
        responsibilities: &[
            "Trained paramedic in accordance with the paramedic training regulations (San-AV), BGB. II Nr. 420/0203",
        ],
    },
    Experience {
        company: None,
        role: "Independent Software Developer",
        from: "September 2015",
        to: Some("July 2018"),
        responsibilities: &[
            "Research and development of mobile applications for iOS (Swift) and backend applications (Node.JS)",
            "Migration from UIKit to CoreGraphics and CoreText for PDF document generation on iOS and macOS",
            "Founding and maintenance of Free Open Source Software (FOSS) as Swift Frameworks",
        ],
    },
    Experience {
        company: Some("Consilio Information Management GmbH"),
        role: "Junior Software Developer",
        from: "July 2016",
        to: Some("August 2016"),
        responsibilities: &[
            "Research and development of mobile applications for iOS (Swift)",
            "App release management via the Apple App Store",
            "Setup of shared code signing certificate management using fastlane (Ruby)",
        ],
    },
    Experience {
        company: Some("Consilio Information Management GmbH"),
        role: "Software Developer Intern",
        from: "August 2015",
        to: None,
        responsibilities: &[
            "Research and development of mobile applications for iOS (Swift)",
            "App release management via the Apple App Store",
        ],
    },
    Experience {
        company: Some("Consilio Information Management GmbH"),
        role: "Software Developer Intern",
        from: "July 2014",
        to: None,
        responsibilities: &[
            "Project setup and development of mobile applications for iOS (Objective-C, Swift)",
            "Design and client-side implementation of API interface",
            "Documentation management for app publishing process (iTunes Connect)",
        ],
    },
];

const SKILLSETS: &[(&str, &[&str])] = &[
    (
        "Mobile App Development",
        &[
            "Swift, Objective-C (10 years)",
            "SwiftUI, UIKit, AppKit",
            "Deep understanding of operating systems iOS and macOS",
            "Build, deployment & release management with App Store Connect",
            "Building complex deployment pipelines using fastlane (Ruby)",
            "Publishing of Swift libraries using Swift Package Manager and Cocoapods",
            "Performance profiling, manual crash symbolication and analysis, binary decompilation (for security research) using Xcode Instruments",
            "Architectural patterns like MVVM, Redux, VIPER",
        ],
    ),
    (
        "Back-end Development",
        &[
            "Node.JS mit Typescript (7 years)",
            "Nest.JS, Next.JS, React",
            "MongoDB, PostgreSQL (5 years)",
            "MongoDB Atlas App Services / Realm",
            "ChakraUI, TailwindCSS",
            "Distributed systems using Kafka, Redis (4 years)",
        ],
    ),
    (
        "Cloud Operations (DevOPs)",
        &[
            "Implementation of scalable cloud solutions using Amazon Web Services (AWS)",
            "Deployment of highly-scalable infrastructure using Kubernetes & Docker containerisation",
            "Infrastructure-as-Code (IaC) using Pulumi",
            "Setup of Continuous Integration / Continuous Delivery (CI/CD) infrastructure and processes (GitHub Actions, GitLab Runner, Bitrise)",
            "Securing remote infrastructure using VPN technologies like Tailscale",
        ],
    ),
    (
        "Open Source Project Management",
        &[
            "Issue Management",
            "Code Review",
            "Quality Assurance",
            "Release Management",
        ],
    ),
    (
        "Technical Conception & Documentation",
        &[
            "Design of distributed systems (Publish-Subscribe, Event-Driven)",
            "Implementation of micro-service architectures",
            "Planning and maintenance of future-proof web application program interfaces (REST API)",
        ],
    ),
];

const EDUCATION: &[Education<'static>] = &[
    Education {
        institution: "TU Wien Innovation Incubation Center (i\u{b2}c)",
        from: 2021,
        to: 2022,
        program: "Startup Incubation Program",
    },
    Education {
        institution: "Vienna University of Technology",
        from: 2017,
        to: 2022,
        program: "Bachelor\u{2019}s of Science in Software & Information Engineering",
    },
    Education {
        institution: "AFS Intercultural Program",
        from: 2012,
        to: 2013,
        program: "High School student exchange program in the United States of America (USA)",
    },
    Education {
        institution: "H\u{f6}here Technische Lehranstalt Bregenz",
        from: 2010,
        to: 2016,
        program: "Matura in Mechanical Engineering for Automation Technologies",
    },
];

const LANGUAGES: &[&str] = &["German (Native)", "English (Fluent)"];

const QUALIFICATIONS: &[&str] = &[
    "Drivers Licenses: A2 and B",
    "CodersRank Top 1% Worldwide (profile.codersrank.io/user/philprime, August 2024)",
    "CodersRank Top 1 Swift Developer Austria (profile.codersrank.io/user/philprime, August 2024)",
    "One of 1,000 developers invited to Apple\u{2019}s Worldwide Developer Conference (WWDC) 2022",
];

const INTERESTS: &[&str] = &[
    "Photography",
    "Cooking",
    "Mountain Biking",
    "Motor Sports",
    "DIY Crafting",
    "3D Printing",
    "Learning Japanese",
];

#[cfg(test)]
mod tests {
    use super::*;
    use cv_document::model::BlockContainer;

    #[test]
    fn cv_builds_with_every_section_in_the_outline() {
        let document = build().expect("cv document");
        assert_eq!(
            document.outline_titles(),
            vec![
                "Profile",
                "Professional Experience",
                "Skills",
                "Academic Education",
                "Languages",
                "Other Qualifications & Achievements",
                "Personal Interests",
            ]
        );
        assert_eq!(document.styles().len(), 8);
        assert!(document.footer().is_some());
        assert_eq!(
            document.pagination().map(|p| p.format(1, Some(3))),
            Some("1 of 3".to_string())
        );
    }

    #[test]
    fn footer_links_point_at_the_project_pages() {
        let document = build().expect("cv document");
        let footer = document.footer().expect("footer note");
        let urls: Vec<&str> = footer
            .lines()
            .iter()
            .flatten()
            .filter_map(|span| span.url())
            .collect();
        assert_eq!(urls, vec![TPPDF_URL, SOURCE_URL]);
    }

    #[test]
    fn interests_are_spread_over_four_columns() {
        let document = build().expect("cv document");
        let Some(ContentBlock::Section(section)) = document.blocks().last() else {
            panic!("last block should be the interests grid");
        };
        let sizes: Vec<usize> = section
            .columns()
            .iter()
            .map(|column| match column.blocks() {
                [ContentBlock::List(list)] => list.items().len(),
                other => panic!("unexpected column content: {other:?}"),
            })
            .collect();
        assert_eq!(sizes, vec![2, 2, 2, 1]);
    }
}
