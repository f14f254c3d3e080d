/*!

This is the long-form manual for `mutual_matching` and `matchmaker`.

## How the matching works

Every participant belongs to one of two groups (`A` and `B`) and names up to three
participants of the other group, in order of preference.

1. The participants are registered. Blank answers and repeated names are dropped, and
   only the first three answers are read. If a participant submits twice, the last
   submission is used.
2. Each participant receives a popularity score: the number of other participants who
   named them. Names that do not correspond to a registered participant are ignored.
3. The participants are considered by decreasing popularity. For each one that is not
   yet paired, its own list is read in order, and it is paired with the first person
   on the list who is not paired yet and who also named it.
4. The table lists group `A` then group `B`, by increasing number, with the partner
   and the ranks that were satisfied on both sides.

This is a greedy procedure. It favors popular participants and never revisits a pair
once it is made, so the result is not a stable matching in the formal sense.

### Quality of a match

| tier                | meaning                                     | color     |
|---------------------|---------------------------------------------|-----------|
| `mutualTopChoice`   | both sides got their first choice           | `#C6EFCE` |
| `partialPreference` | at least one side got its 2nd or 3rd choice | `#FFF2CC` |
| `unmatched`         | no partner                                  | `#D3D3D3` |

### Ties

Participants with the same popularity are ordered according to the `tiebreakMode` rule:

* `firstReference` (default): the order in which they were first named, reading the
  lists of group `A` first, then the lists of group `B`, in submission order.
* `participantOrder`: group `A` first, then by increasing number.
* `random`: an order derived from a cryptographic hash of `randomSeed` and the
  participant. The same seed always gives the same order.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values
* `xlsx` Excel spreadsheets, for example the responses of a Google Form downloaded in the Excel format.

In both cases, every row is one participant. The layout follows the responses of a form:

```text
Timestamp,Group,Number,Choice 1,Choice 2,Choice 3
2024/02/14 20:01,A,1,1,3,
2024/02/14 20:03,B,1,2,1,
```

The columns are controlled by the configuration (all indexes start at 1):
 - `groupColumnIndex` (default 2): the column with the group of the participant
 - `idColumnIndex` (default 3): the column with the number of the participant
 - `firstPreferenceColumnIndex` (default 4): the column of the first choice. The next two
   columns are the second and the third choices.
 - `firstDataRowIndex` (default 2): the first row with data. The default skips one header row.

The values in the group column are translated with `groupLabels`. For example
`["M", "F"]` puts all the `M` participants in group `A` and all the `F` participants
in group `B`. The default is `["A", "B"]`.

## Configuration

`matchmaker` accepts a configuration file in JSON:

```text
{
  "outputSettings": {
    "contestName": "Valentine evening",
    "outputDirectory": "output",
    "resultTable": "pairs.csv"
  },
  "participantSources": [
    {
      "provider": "xlsx",
      "filePath": "responses.xlsx",
      "excelWorksheetName": "Form Responses 1",
      "groupLabels": ["M", "F"]
    }
  ],
  "rules": {
    "tiebreakMode": "firstReference"
  }
}
```

All the command line flags have an equivalent in the configuration file. When both are
provided, the command line wins.

## Outputs

 - the result table (`--table` or `resultTable`), a CSV file with one line per participant:
   `participant,partner,rank,tier,color`
 - the summary (`--out`), a JSON document with the table, the order in which the
   participants were considered, and the counts of each tier. Use `stdout` to print it.

 */
